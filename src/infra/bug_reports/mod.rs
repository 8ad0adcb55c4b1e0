// Bug report infra layer.
// - `in_memory_cooldowns.rs` keeps per-author cooldowns for the process lifetime.
// - `squad_bridge_client.rs` talks to the game-server bridge over HTTP.
// - `chat_feed.rs` reads chat events as JSON lines.

pub mod chat_feed;
pub mod in_memory_cooldowns;
pub mod squad_bridge_client;

pub use chat_feed::ChatFeed;
pub use in_memory_cooldowns::InMemoryCooldownStore;
pub use squad_bridge_client::SquadBridgeClient;
