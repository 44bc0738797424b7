use eframe::egui::Color32;

use crate::geo::Brand;

use super::render_utils::blend_color;

/// Size tier of a cluster icon. Thresholds mirror the original map assets:
/// a plain marker below 2, then small/medium/big buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IconTier {
    Single,
    Small,
    Medium,
    Large,
}

impl IconTier {
    pub fn for_size(size: usize) -> Self {
        if size < 2 {
            Self::Single
        } else if size < 5 {
            Self::Small
        } else if size < 10 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            Self::Single => 8.0,
            Self::Small => 12.0,
            Self::Medium => 15.0,
            Self::Large => 19.0,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ClusterStyle {
    pub tier: IconTier,
    /// Member count rendered over the icon; absent for single markers.
    pub badge: Option<String>,
}

/// Maps cluster sizes to brand-colored icons. One styler per view; the brand
/// never changes after startup.
pub(crate) struct ClusterStyler {
    base: Color32,
}

impl ClusterStyler {
    pub fn new(brand: Brand) -> Self {
        let base = match brand {
            Brand::Bosman => Color32::from_rgb(214, 69, 65),
            Brand::Piast => Color32::from_rgb(223, 166, 48),
            Brand::Harnas => Color32::from_rgb(52, 133, 88),
        };
        Self { base }
    }

    pub fn style_for(&self, size: usize) -> ClusterStyle {
        ClusterStyle {
            tier: IconTier::for_size(size),
            badge: (size >= 2).then(|| size.to_string()),
        }
    }

    /// Larger tiers darken toward black so dense clusters read at a glance.
    pub fn fill(&self, tier: IconTier) -> Color32 {
        let darken = match tier {
            IconTier::Single => 0.0,
            IconTier::Small => 0.15,
            IconTier::Medium => 0.28,
            IconTier::Large => 0.4,
        };
        blend_color(self.base, Color32::BLACK, darken)
    }

    pub fn badge_color(&self) -> Color32 {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_size_buckets() {
        assert_eq!(IconTier::for_size(1), IconTier::Single);
        assert_eq!(IconTier::for_size(3), IconTier::Small);
        assert_eq!(IconTier::for_size(7), IconTier::Medium);
        assert_eq!(IconTier::for_size(15), IconTier::Large);
    }

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(IconTier::for_size(2), IconTier::Small);
        assert_eq!(IconTier::for_size(4), IconTier::Small);
        assert_eq!(IconTier::for_size(5), IconTier::Medium);
        assert_eq!(IconTier::for_size(9), IconTier::Medium);
        assert_eq!(IconTier::for_size(10), IconTier::Large);
    }

    #[test]
    fn single_markers_carry_no_badge() {
        let styler = ClusterStyler::new(Brand::Bosman);
        assert!(styler.style_for(1).badge.is_none());
    }

    #[test]
    fn badge_text_is_the_member_count() {
        let styler = ClusterStyler::new(Brand::Piast);
        assert_eq!(styler.style_for(3).badge.as_deref(), Some("3"));
        assert_eq!(styler.style_for(15).badge.as_deref(), Some("15"));
    }

    #[test]
    fn fills_darken_with_tier() {
        let styler = ClusterStyler::new(Brand::Harnas);
        let single = styler.fill(IconTier::Single);
        let large = styler.fill(IconTier::Large);
        assert!(large.r() < single.r());
        assert!(large.g() < single.g());
    }
}
