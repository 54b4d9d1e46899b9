mod method_not_allowed;
mod not_found;

pub use method_not_allowed::method_not_allowed_handler;
pub use not_found::not_found_handler;
