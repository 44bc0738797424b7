/// Fixed brand allow-list. Unrecognized names fall back to the default brand
/// instead of failing, matching how unknown subdomains behaved upstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Brand {
    #[default]
    Bosman,
    Piast,
    Harnas,
}

impl Brand {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bosman" => Self::Bosman,
            "piast" => Self::Piast,
            "harnas" => Self::Harnas,
            other => {
                tracing::warn!(brand = other, "unrecognized brand, using default");
                Self::default()
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bosman => "bosman",
            Self::Piast => "piast",
            Self::Harnas => "harnas",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve_case_insensitively() {
        assert_eq!(Brand::from_name("PIAST"), Brand::Piast);
        assert_eq!(Brand::from_name("  harnas "), Brand::Harnas);
        assert_eq!(Brand::from_name("bosman"), Brand::Bosman);
    }

    #[test]
    fn unknown_names_fall_back_to_default() {
        assert_eq!(Brand::from_name("zywiec"), Brand::Bosman);
        assert_eq!(Brand::from_name(""), Brand::Bosman);
    }
}
