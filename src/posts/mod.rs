pub mod comments;
pub mod crud;
pub mod likes;
