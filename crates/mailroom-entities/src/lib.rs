pub mod bounces;

pub mod prelude {
    pub use super::bounces::Entity as Bounces;
}
