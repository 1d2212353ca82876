//! Enumeration types for the Covey Town service.
//!
//! Species, trainer sprites, and elemental types are closed sets that the
//! frontend renders by name, so each variant serializes to the lowercase
//! name the client expects.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a closed, lowercase-serialized name enum with a lookup table.
macro_rules! name_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub enum $name {
            $(
                #[doc = concat!("The `", $text, "` ", $what, ".")]
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The lowercase wire name of this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Look up a variant by its lowercase wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// The direction a player or pokemon sprite is facing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// Facing the camera.
    #[default]
    Front,
    /// Facing away from the camera.
    Back,
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

name_enum! {
    /// A pokemon species that can spawn in a town.
    ///
    /// Only the starters spawn from the beginning; every other species is
    /// unlocked by completing an achievement.
    SpeciesName, "species" {
        Piplup => "piplup",
        Turtwig => "turtwig",
        Chimchar => "chimchar",
        Magikarp => "magikarp",
        Pikachu => "pikachu",
        Eevee => "eevee",
        Charmander => "charmander",
        Charizard => "charizard",
        Bulbasaur => "bulbasaur",
        Gengar => "gengar",
        Squirtle => "squirtle",
        Snorlax => "snorlax",
        Umbreon => "umbreon",
        Arcanine => "arcanine",
        Jigglypuff => "jigglypuff",
        Dragonite => "dragonite",
        Lucario => "lucario",
        Dialga => "dialga",
        Palkia => "palkia",
        Mewtwo => "mewtwo",
        Blastoise => "blastoise",
        Ninetales => "ninetales",
        Garchomp => "garchomp",
        Lugia => "lugia",
        Marowak => "marowak",
        Hitmonlee => "hitmonlee",
        Hitmonchan => "hitmonchan",
        Lickitung => "lickitung",
        Koffing => "koffing",
        Weezing => "weezing",
        Rhyhorn => "rhyhorn",
        Rhydon => "rhydon",
        Chansey => "chansey",
        Tangela => "tangela",
        Kangaskhan => "kangaskhan",
        Horsea => "horsea",
        Goldeen => "goldeen",
        Seaking => "seaking",
        Beautifly => "beautifly",
        Psyduck => "psyduck",
        Alakazam => "alakazam",
        Rapidash => "rapidash",
        Krabby => "krabby",
        Vaporeon => "vaporeon",
        Chikorita => "chikorita",
        Totodile => "totodile",
        Bonsly => "bonsly",
        Munchlax => "munchlax",
        Finneon => "finneon",
        Cleffa => "cleffa",
        Pichu => "pichu",
        Octillery => "octillery",
        Buizel => "buizel",
        Hoppip => "hoppip",
        Sceptile => "sceptile",
        Venomoth => "venomoth",
        Meowth => "meowth",
        Vulpix => "vulpix",
        Rattata => "rattata",
        Clefairy => "clefairy",
        Diglett => "diglett",
        Togepi => "togepi",
        Marill => "marill",
        Sandshrew => "sandshrew",
        Slowpoke => "slowpoke",
    }
}

name_enum! {
    /// Elemental type of a species, as reported by the species catalog.
    SpeciesType, "type" {
        Shadow => "shadow",
        Unknown => "unknown",
        Fairy => "fairy",
        Dark => "dark",
        Dragon => "dragon",
        Ice => "ice",
        Psychic => "psychic",
        Electric => "electric",
        Grass => "grass",
        Water => "water",
        Fire => "fire",
        Steel => "steel",
        Ghost => "ghost",
        Bug => "bug",
        Rock => "rock",
        Ground => "ground",
        Poison => "poison",
        Flying => "flying",
        Fighting => "fighting",
        Normal => "normal",
    }
}

// ---------------------------------------------------------------------------
// Trainers
// ---------------------------------------------------------------------------

name_enum! {
    /// Sprite set a player picks when joining a town.
    TrainerName, "trainer sprite" {
        Lucas => "lucas",
        Dawn => "dawn",
        Barry => "barry",
        Cynthia => "cynthia",
        Cyrus => "cyrus",
        Rowan => "rowan",
        Oak => "oak",
        Misty => "misty",
        Cheryl => "cheryl",
        Wake => "wake",
        Byron => "byron",
        Candice => "candice",
        Gardenia => "gardenia",
        Flint => "flint",
        Bertha => "bertha",
        Palmer => "palmer",
        Hatboy => "hatboy",
        Farmgirl => "farmgirl",
        Grunt => "grunt",
        Karate => "karate",
        Mom => "mom",
        Katie => "katie",
        Karen => "karen",
        Tubegirl => "tubegirl",
    }
}

impl Default for TrainerName {
    fn default() -> Self {
        Self::Lucas
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// The kind of town event an achievement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum AchievementCategory {
    /// A player joined the town.
    Players,
    /// A player reported a movement tick.
    Moves,
    /// A conversation area was created.
    ConversationAreas,
    /// A chat message was sent.
    Chats,
    /// A wild pokemon was caught.
    Pokemon,
}

impl AchievementCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Players,
        Self::Moves,
        Self::ConversationAreas,
        Self::Chats,
        Self::Pokemon,
    ];
}

/// Key of an achievement in the town's achievement list.
///
/// The wire names match what the frontend displays, e.g. `"2players"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AchievementKey {
    /// Two players have joined.
    #[serde(rename = "2players")]
    Players2,
    /// Five players have joined.
    #[serde(rename = "5players")]
    Players5,
    /// Ten players have joined.
    #[serde(rename = "10players")]
    Players10,
    /// Twenty-five players have joined.
    #[serde(rename = "25players")]
    Players25,
    /// Fifty players have joined.
    #[serde(rename = "50players")]
    Players50,
    /// First movement milestone.
    #[serde(rename = "10moves")]
    Moves10,
    /// Second movement milestone.
    #[serde(rename = "25moves")]
    Moves25,
    /// Third movement milestone.
    #[serde(rename = "50moves")]
    Moves50,
    /// Fourth movement milestone.
    #[serde(rename = "100moves")]
    Moves100,
    /// Final movement milestone.
    #[serde(rename = "1000moves")]
    Moves1000,
    /// One conversation area created.
    #[serde(rename = "1conversationAreas")]
    ConversationAreas1,
    /// Three conversation areas created.
    ///
    /// The misspelled wire name is the one existing clients look up.
    #[serde(rename = "3conversateionAreas")]
    #[serde(alias = "3conversationAreas")]
    ConversationAreas3,
    /// Five conversation areas created.
    #[serde(rename = "5conversationAreas")]
    ConversationAreas5,
    /// One chat message sent.
    #[serde(rename = "1chats")]
    Chats1,
    /// Five chat messages sent.
    #[serde(rename = "5chats")]
    Chats5,
    /// Twenty-five chat messages sent.
    #[serde(rename = "25chats")]
    Chats25,
    /// One hundred chat messages sent.
    #[serde(rename = "100chats")]
    Chats100,
    /// Ten pokemon caught.
    #[serde(rename = "10pokemonCaught")]
    PokemonCaught10,
    /// Twenty-five pokemon caught.
    #[serde(rename = "25pokemonCaught")]
    PokemonCaught25,
    /// Fifty pokemon caught.
    #[serde(rename = "50pokemonCaught")]
    PokemonCaught50,
    /// One hundred pokemon caught.
    #[serde(rename = "100pokemonCaught")]
    PokemonCaught100,
}
