pub mod auth_token;
pub mod user;

pub use auth_token::{AuthToken, TokenPair};
pub use user::{
    EmailOtp, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, ResendOtpRequest,
    UpdateProfileRequest, User, UserProfile, UserRole, VerifyOtpRequest,
};
