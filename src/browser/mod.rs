pub mod chrome;

pub use chrome::ChromePage;
