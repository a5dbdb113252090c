//! Sprite assets and combatant sprite assignment
//!
//! Each combatant is drawn with one emote sprite. Sprite dimensions also
//! decide the combatant's collision size, so assignment happens in the core
//! even though the pixels live on the render surface.

use serde::{Deserialize, Serialize};

use super::components::{GameRng, Subscriber};

/// A drawable emote that can represent a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteAsset {
    /// Emote name as it appears in chat
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// Whether this emote may be used as a battle combatant
    #[serde(default = "default_battle_eligible")]
    pub battle_eligible: bool,
}

fn default_battle_eligible() -> bool {
    true
}

impl SpriteAsset {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            battle_eligible: true,
        }
    }

    /// Decorative emote that chat can use but that never fights.
    pub fn decorative(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            battle_eligible: false,
            ..Self::new(name, width, height)
        }
    }

    /// Collision size used by the combat resolver.
    pub fn size(&self) -> f32 {
        (self.width + self.height) / 2.0
    }
}

/// The emote set known to the overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteCatalog {
    pub assets: Vec<SpriteAsset>,
}

impl Default for SpriteCatalog {
    fn default() -> Self {
        Self {
            assets: vec![
                SpriteAsset::new("PogChamp", 56.0, 56.0),
                SpriteAsset::new("Kappa", 50.0, 64.0),
                SpriteAsset::new("LUL", 60.0, 56.0),
                SpriteAsset::new("monkaS", 56.0, 56.0),
                SpriteAsset::new("PepeLaugh", 64.0, 56.0),
                SpriteAsset::new("catJAM", 56.0, 64.0),
                SpriteAsset::new("OMEGALUL", 60.0, 60.0),
                SpriteAsset::new("Sadge", 52.0, 52.0),
                SpriteAsset::new("KEKW", 58.0, 58.0),
                SpriteAsset::new("peepoHappy", 56.0, 52.0),
                SpriteAsset::decorative("HeyGuys", 48.0, 48.0),
                SpriteAsset::decorative("VoHiYo", 48.0, 48.0),
            ],
        }
    }
}

impl SpriteCatalog {
    pub fn new(assets: Vec<SpriteAsset>) -> Self {
        Self { assets }
    }

    pub fn empty() -> Self {
        Self { assets: Vec::new() }
    }

    pub fn find(&self, name: &str) -> Option<&SpriteAsset> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn battle_eligible(&self) -> impl Iterator<Item = &SpriteAsset> {
        self.assets.iter().filter(|a| a.battle_eligible)
    }

    /// Pick a sprite for every candidate.
    ///
    /// Assets are distinct while unused eligible ones remain: a name-affinity
    /// match (case-insensitive containment between username and emote name)
    /// wins, otherwise the next asset from a shuffled list is taken. Once the
    /// list is exhausted, assets are reused round-robin. With no eligible
    /// asset at all, nobody can be spawned and the result is empty.
    pub fn assign(
        &self,
        candidates: &[Subscriber],
        rng: &mut GameRng,
    ) -> Vec<(Subscriber, SpriteAsset)> {
        let mut shuffled: Vec<&SpriteAsset> = self.battle_eligible().collect();
        if shuffled.is_empty() {
            return Vec::new();
        }
        rng.shuffle(&mut shuffled);

        let mut used = vec![false; shuffled.len()];
        let mut cursor = 0;
        let mut assigned = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let username = candidate.username.to_lowercase();
            let affinity = shuffled.iter().enumerate().position(|(i, asset)| {
                let name = asset.name.to_lowercase();
                !used[i] && (username.contains(&name) || name.contains(&username))
            });

            let index = match affinity {
                Some(index) => index,
                None => match (0..shuffled.len()).find(|i| !used[*i]) {
                    Some(index) => index,
                    None => {
                        let index = cursor % shuffled.len();
                        cursor += 1;
                        index
                    }
                },
            };

            used[index] = true;
            assigned.push((candidate.clone(), shuffled[index].clone()));
        }

        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(names: &[&str]) -> Vec<Subscriber> {
        names.iter().map(|n| Subscriber::new(*n)).collect()
    }

    #[test]
    fn test_assets_are_distinct_while_available() {
        let catalog = SpriteCatalog::default();
        let mut rng = GameRng::from_seed(3);
        let assigned = catalog.assign(&subs(&["a", "b", "c", "d"]), &mut rng);

        assert_eq!(assigned.len(), 4);
        let mut names: Vec<_> = assigned.iter().map(|(_, s)| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert!(assigned.iter().all(|(_, s)| s.battle_eligible));
    }

    #[test]
    fn test_name_affinity_is_preferred() {
        let catalog = SpriteCatalog::default();
        let mut rng = GameRng::from_seed(11);
        let assigned = catalog.assign(&subs(&["xX_kappa_Xx", "catjamfan"]), &mut rng);

        assert_eq!(assigned[0].1.name, "Kappa");
        assert_eq!(assigned[1].1.name, "catJAM");
    }

    #[test]
    fn test_assets_are_reused_round_robin_when_exhausted() {
        let catalog = SpriteCatalog::new(vec![
            SpriteAsset::new("One", 50.0, 50.0),
            SpriteAsset::new("Two", 50.0, 50.0),
        ]);
        let mut rng = GameRng::from_seed(5);
        let assigned = catalog.assign(&subs(&["a", "b", "c", "d"]), &mut rng);

        assert_eq!(assigned.len(), 4);
        assert_ne!(assigned[0].1.name, assigned[1].1.name);
        assert_eq!(assigned[2].1.name, assigned[0].1.name);
        assert_eq!(assigned[3].1.name, assigned[1].1.name);
    }

    #[test]
    fn test_no_eligible_assets_spawns_nobody() {
        let catalog = SpriteCatalog::new(vec![SpriteAsset::decorative("HeyGuys", 48.0, 48.0)]);
        let mut rng = GameRng::from_seed(5);
        assert!(catalog.assign(&subs(&["a", "b", "c"]), &mut rng).is_empty());
    }

    #[test]
    fn test_size_is_mean_of_dimensions() {
        assert_eq!(SpriteAsset::new("x", 40.0, 60.0).size(), 50.0);
    }
}
