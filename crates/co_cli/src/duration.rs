use std::str::FromStr;
use std::time::Duration;

/// `1h`, `30m`, `1d`, `1h15m30s`; a bare number means seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

fn unit_seconds(unit: char) -> Option<u64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3_600),
        'd' => Some(86_400),
        _ => None,
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err("Duration cannot be empty".to_string());
        }

        let mut total_seconds = 0u64;
        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("Expected a number at \"{}\"", rest));
            }
            let value: u64 = rest[..digits]
                .parse()
                .map_err(|_| format!("Number too large in duration: {}", s))?;
            rest = &rest[digits..];

            let mut chars = rest.chars();
            let factor = match chars.next() {
                None => 1,
                Some(unit) => {
                    rest = chars.as_str().trim_start();
                    unit_seconds(unit).ok_or_else(|| format!("Invalid duration unit: {}", unit))?
                }
            };
            total_seconds = value
                .checked_mul(factor)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(|| format!("Duration is too long: {}", s))?;
        }

        if total_seconds == 0 {
            return Err("Duration must be longer than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: &str) -> u64 {
        s.parse::<HumanDuration>().unwrap().0.as_secs()
    }

    #[test]
    fn test_units() {
        assert_eq!(secs("45"), 45);
        assert_eq!(secs("30m"), 1800);
        assert_eq!(secs("1d"), 86_400);
        assert_eq!(secs("1h15m30s"), 4530);
        assert_eq!(secs("1h 30m"), 5400);
    }

    #[test]
    fn test_rejects_overflow() {
        assert!("300000000000000d".parse::<HumanDuration>().is_err());
        assert!("99999999999999999999s".parse::<HumanDuration>().is_err());
        let max = format!("{}s1s", u64::MAX);
        assert!(max.parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("".parse::<HumanDuration>().is_err());
        assert!("1w".parse::<HumanDuration>().is_err());
        assert!("h".parse::<HumanDuration>().is_err());
        assert!("0s".parse::<HumanDuration>().is_err());
    }
}
