// Application layer - Services, stores and view state
pub mod athlete_service;
pub mod cursor;
pub mod selection;
pub mod series_resolver;
pub mod session_view;
pub mod stores;
pub mod streaming_service;
pub mod view_service;
