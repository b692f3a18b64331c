use geo::MultiPolygon;

/// Privacy rating grade, best (`a`) to worst (`e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    A,
    B,
    C,
    D,
    E,
}

impl Score {
    /// Parse the wire code from the feature properties. Anything outside
    /// the known enumeration is treated as an unknown score.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Score::A),
            "b" => Some(Score::B),
            "c" => Some(Score::C),
            "d" => Some(Score::D),
            "e" => Some(Score::E),
            _ => None,
        }
    }

    /// Lower-case wire form, as stored in the feature collection.
    pub fn code(self) -> &'static str {
        match self {
            Score::A => "a",
            Score::B => "b",
            Score::C => "c",
            Score::D => "d",
            Score::E => "e",
        }
    }

    /// Upper-case display form used in the table and tooltip.
    pub fn label(self) -> &'static str {
        match self {
            Score::A => "A",
            Score::B => "B",
            Score::C => "C",
            Score::D => "D",
            Score::E => "E",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Municipality {
    pub name: String,
    pub score: Option<Score>,
    pub site_url: String,
    pub geometry: MultiPolygon<f64>,
    // Extra table cells joined from the results CSV, aligned with Dataset::columns.
    pub details: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub municipalities: Vec<Municipality>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_codes_case_insensitively() {
        assert_eq!(Score::parse("a"), Some(Score::A));
        assert_eq!(Score::parse("E"), Some(Score::E));
        assert_eq!(Score::parse(" c "), Some(Score::C));
    }

    #[test]
    fn unknown_codes_parse_to_none() {
        assert_eq!(Score::parse("z"), None);
        assert_eq!(Score::parse(""), None);
        assert_eq!(Score::parse("ab"), None);
    }

    #[test]
    fn label_is_uppercased_code() {
        for score in [Score::A, Score::B, Score::C, Score::D, Score::E] {
            assert_eq!(score.label(), score.code().to_ascii_uppercase());
        }
    }
}
