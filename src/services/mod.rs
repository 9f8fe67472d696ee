pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthUser, LoginResult, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod rating_service;
pub mod rating_service_impl;
pub use rating_service::{RatingError, RatingService};
pub use rating_service_impl::SeaOrmRatingService;

pub mod store_service;
pub mod store_service_impl;
pub use store_service::{StoreError, StoreInput, StoreService};
pub use store_service_impl::SeaOrmStoreService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{DashboardStats, NewAccount, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
