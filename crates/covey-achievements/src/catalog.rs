//! The achievement list every new town starts with.

use covey_types::{
    Achievement, AchievementCategory, AchievementKey, AchievementList, SpeciesName,
};

/// Fresh, uncompleted achievements for a new town.
pub fn default_achievements() -> AchievementList {
    use AchievementCategory as C;
    use AchievementKey as K;
    use SpeciesName as S;

    let entries: [(K, C, u64, &[S]); 21] = [
        (K::Players2, C::Players, 2, &[S::Magikarp, S::Clefairy]),
        (K::Players5, C::Players, 5, &[S::Squirtle, S::Weezing]),
        (K::Players10, C::Players, 10, &[S::Bulbasaur, S::Rhyhorn, S::Venomoth]),
        (K::Players25, C::Players, 25, &[S::Charmander, S::Rhydon, S::Meowth]),
        (K::Players50, C::Players, 50, &[S::Jigglypuff, S::Chansey, S::Beautifly]),
        (K::Moves10, C::Moves, 500, &[S::Eevee, S::Krabby, S::Vulpix]),
        (K::Moves25, C::Moves, 2500, &[S::Umbreon, S::Kangaskhan, S::Chikorita]),
        (K::Moves50, C::Moves, 5000, &[S::Gengar, S::Horsea, S::Totodile]),
        (K::Moves100, C::Moves, 10_000, &[S::Dragonite, S::Tangela, S::Bonsly]),
        (K::Moves1000, C::Moves, 100_000, &[S::Mewtwo, S::Rattata]),
        (K::ConversationAreas1, C::ConversationAreas, 1, &[S::Arcanine, S::Goldeen]),
        (K::ConversationAreas3, C::ConversationAreas, 3, &[S::Lucario, S::Seaking, S::Munchlax]),
        (K::ConversationAreas5, C::ConversationAreas, 5, &[S::Dialga, S::Psyduck, S::Diglett]),
        (K::Chats1, C::Chats, 1, &[S::Pikachu]),
        (K::Chats5, C::Chats, 5, &[S::Snorlax, S::Togepi]),
        (K::Chats25, C::Chats, 25, &[S::Charizard, S::Pichu]),
        (K::Chats100, C::Chats, 100, &[S::Palkia, S::Octillery, S::Marill]),
        (K::PokemonCaught10, C::Pokemon, 10, &[S::Blastoise]),
        (K::PokemonCaught25, C::Pokemon, 25, &[S::Ninetales, S::Sandshrew]),
        (K::PokemonCaught50, C::Pokemon, 50, &[S::Garchomp, S::Vaporeon]),
        (K::PokemonCaught100, C::Pokemon, 100, &[S::Lugia, S::Sceptile, S::Slowpoke]),
    ];

    entries
        .into_iter()
        .map(|(key, category, threshold, unlocks)| {
            (
                key,
                Achievement {
                    category,
                    completed: false,
                    pokemon_name: unlocks.to_vec(),
                    threshold,
                },
            )
        })
        .collect()
}
