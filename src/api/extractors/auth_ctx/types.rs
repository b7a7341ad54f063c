/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - access middleware が認証後に request extensions に格納する
 */

/// Context attached to a request that passed authentication.
///
/// - `uid` is the subject from the verified token, already confirmed to be
///   in the authorization set at the time of the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub uid: String,
}

impl AuthCtx {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}
