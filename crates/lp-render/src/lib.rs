pub mod chrome;
pub mod composite;
pub mod hit;

pub use chrome::{MarqueeChrome, SelectionChrome, marquee_chrome, selection_chrome};
pub use composite::{composite_scene, cut};
pub use hit::{hit_handle, hit_test};
