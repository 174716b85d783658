use std::time::Duration;

use reqwest::Client;

/// The portals keep their download gate in session cookies, so every
/// client here carries a cookie store.
pub fn try_new_session() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .cookie_store(true)
        .timeout(Duration::from_secs(30))
        .build()
}
