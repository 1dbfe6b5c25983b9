pub mod absence;
pub mod call_out;
pub mod clock;
pub mod config;
pub mod csv_export;
pub mod csv_import;
pub mod danlon_api;
pub mod danlon_oauth;
pub mod date_fill;
pub mod ftz_api;
pub mod ftz_auth;
pub mod mapping;
pub mod overtime;
pub mod preview;
pub mod processing;
pub mod sync;
pub mod time_split;
pub mod uuid_service;

mod test;

pub use clock::ClockServiceImpl;
pub use uuid_service::UuidServiceImpl;
