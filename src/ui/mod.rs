pub mod app;
pub mod draw;
pub mod form;
pub mod list;
pub mod view;
pub mod worker;
