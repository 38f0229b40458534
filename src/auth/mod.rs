//! Auth & kit protocol (§4.5): everything that talks to `/v2/login*`.

pub mod auth_json;
pub mod create;
pub mod kit;
pub mod sanitize;
pub mod server_login;
pub mod sync;

pub use auth_json::{get_stash_otp, make_auth_json, LoginOtpOptions};
pub use create::{create_login, CreateLoginOptions, Parent};
pub use kit::{apply_kit, apply_kits};
pub use sanitize::sanitize_login_stash;
pub use server_login::server_login;
pub use sync::sync_login;
