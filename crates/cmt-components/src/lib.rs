pub mod components;
mod lifecycle;
