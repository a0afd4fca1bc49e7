pub mod collection;
pub mod place;
pub mod recommendation;
pub mod route;
pub mod trip;
