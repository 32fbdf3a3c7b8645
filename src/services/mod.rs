pub mod admin_user_service;
pub mod admin_user_service_impl;
pub mod auth_service;
pub mod auth_service_impl;

pub use admin_user_service::{
    AdminUser, AdminUserError, AdminUserService, CreateAdminUser, UpdateAdminUser, visibility_for,
};
pub use admin_user_service_impl::SeaOrmAdminUserService;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
