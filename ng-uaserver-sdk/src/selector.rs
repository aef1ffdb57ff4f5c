use crate::DataSourceError;
use std::{fmt, str::FromStr};

/// A sub-range specifier on a read or write request.
///
/// Text form follows the protocol's index range syntax: `"3"`, `"1:4"`, and
/// comma-separated dimensions such as `"1:4,0"`. An absent selector is
/// expressed as `Option::None`, so every `Selector` value is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(u32),
    /// Inclusive range, `low < high`.
    Range(u32, u32),
    /// One entry per dimension.
    Dimensions(Vec<Selector>),
}

impl FromStr for Selector {
    type Err = DataSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DataSourceError::InvalidRange);
        }
        if s.contains(',') {
            let dims = s
                .split(',')
                .map(parse_dimension)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Selector::Dimensions(dims));
        }
        parse_dimension(s)
    }
}

fn parse_dimension(s: &str) -> Result<Selector, DataSourceError> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| DataSourceError::InvalidRange)
    };
    match s.split_once(':') {
        Some((low, high)) => {
            let (low, high) = (parse(low)?, parse(high)?);
            if low >= high {
                return Err(DataSourceError::InvalidRange);
            }
            Ok(Selector::Range(low, high))
        }
        None => Ok(Selector::Index(parse(s)?)),
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(i) => write!(f, "{i}"),
            Selector::Range(low, high) => write!(f, "{low}:{high}"),
            Selector::Dimensions(dims) => {
                for (idx, dim) in dims.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{dim}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_index_range_and_dimensions() {
        assert_eq!("7".parse::<Selector>(), Ok(Selector::Index(7)));
        assert_eq!("1:4".parse::<Selector>(), Ok(Selector::Range(1, 4)));
        assert_eq!(
            "1:4,0".parse::<Selector>(),
            Ok(Selector::Dimensions(vec![
                Selector::Range(1, 4),
                Selector::Index(0)
            ]))
        );
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert_eq!("".parse::<Selector>(), Err(DataSourceError::InvalidRange));
        assert_eq!("4:1".parse::<Selector>(), Err(DataSourceError::InvalidRange));
        assert_eq!("2:2".parse::<Selector>(), Err(DataSourceError::InvalidRange));
        assert_eq!("a".parse::<Selector>(), Err(DataSourceError::InvalidRange));
    }

    #[test]
    fn display_matches_text_form() {
        let sel: Selector = "1:4,0".parse().unwrap();
        assert_eq!(sel.to_string(), "1:4,0");
    }
}
