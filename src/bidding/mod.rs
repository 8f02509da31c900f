pub mod commands;
pub mod locks;
pub mod model;
pub mod validator;
