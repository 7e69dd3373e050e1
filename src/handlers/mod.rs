pub mod event_actor;
pub mod events;
pub mod keyboard;
pub mod map_view;
pub mod sensor;
pub mod session;
pub mod websocket_actor;
