/// Rank for entities whose tag is missing or not in the hierarchy. Every
/// configured tag ranks above it.
pub const UNRANKED: i32 = 0;

pub const DEFAULT_TAG_HIERARCHY: &[&str] = &["default", "trajectory", "robot"];

/// Maps entity tags to draw-order ranks. The first tag in the hierarchy gets
/// the lowest configured rank and is drawn first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZIndexManager {
    hierarchy: Vec<String>,
}

impl Default for ZIndexManager {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_HIERARCHY.iter().copied())
    }
}

impl ZIndexManager {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manager = Self {
            hierarchy: Vec::new(),
        };
        manager.set_tag_hierarchy(tags);
        manager
    }

    /// Replaces the hierarchy. A tag listed twice keeps its first position.
    pub fn set_tag_hierarchy<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hierarchy.clear();
        for tag in tags {
            let tag = tag.into();
            if !self.hierarchy.contains(&tag) {
                self.hierarchy.push(tag);
            }
        }
    }

    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn rank_of(&self, tag: Option<&str>) -> i32 {
        let Some(tag) = tag else {
            return UNRANKED;
        };
        self.hierarchy
            .iter()
            .position(|known| known == tag)
            .map_or(UNRANKED, |index| index as i32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_listed_tag_ranks_lowest_among_configured() {
        let manager = ZIndexManager::new(["a", "b", "c"]);
        assert_eq!(manager.rank_of(Some("a")), 1);
        assert_eq!(manager.rank_of(Some("b")), 2);
        assert_eq!(manager.rank_of(Some("c")), 3);
    }

    #[test]
    fn missing_and_unknown_tags_rank_below_everything() {
        let manager = ZIndexManager::new(["a"]);
        assert_eq!(manager.rank_of(None), UNRANKED);
        assert_eq!(manager.rank_of(Some("zzz")), UNRANKED);
        assert!(manager.rank_of(Some("a")) > UNRANKED);
    }

    #[test]
    fn replacing_hierarchy_reranks_tags() {
        let mut manager = ZIndexManager::new(["a", "b"]);
        manager.set_tag_hierarchy(["b", "a"]);
        assert_eq!(manager.rank_of(Some("b")), 1);
        assert_eq!(manager.rank_of(Some("a")), 2);
    }

    #[test]
    fn duplicate_tags_keep_first_position() {
        let manager = ZIndexManager::new(["a", "b", "a"]);
        assert_eq!(manager.hierarchy(), ["a".to_string(), "b".to_string()]);
        assert_eq!(manager.rank_of(Some("a")), 1);
    }

    #[test]
    fn default_hierarchy_draws_robot_over_trajectory_over_default() {
        let manager = ZIndexManager::default();
        let default = manager.rank_of(Some("default"));
        let trajectory = manager.rank_of(Some("trajectory"));
        let robot = manager.rank_of(Some("robot"));
        assert!(default < trajectory && trajectory < robot);
    }
}
