use serde::{Deserialize, Serialize};

/// Player-selectable factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    ForestElves,
    PalaceGuard,
    Villain,
}

impl Faction {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ForestElves => "Forest Elves",
            Self::PalaceGuard => "Palace Guard",
            Self::Villain => "Villain",
        }
    }

    pub fn all() -> &'static [Faction] {
        &[Self::ForestElves, Self::PalaceGuard, Self::Villain]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_distinct() {
        let names: Vec<_> = Faction::all().iter().map(|f| f.display_name()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.windows(2).all(|w| w[0] != w[1]));
    }
}
