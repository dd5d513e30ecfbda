pub mod scheduler;
pub mod session;
pub mod user;

pub use self::{
    session::{Session, SessionUser},
    user::Role,
};
