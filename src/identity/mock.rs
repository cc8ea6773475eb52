use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};

use super::{Credentials, IdentityProvider, TokenInfo};
use crate::catalog::Profile;
use crate::errors::ProviderError;

/// What the mock provider answers for one authorization code.
#[derive(Clone, Debug)]
pub struct MockGrant {
    pub subject: String,
    pub access_token: String,
    pub profile: Profile,

    /// The user the token introspection claims the token belongs to.
    pub token_user_id: String,

    /// The client the token introspection claims the token was issued to.
    pub issued_to: String,

    /// An error reported by token introspection instead of the token details.
    pub token_error: Option<String>,
}

impl MockGrant {
    /// A consistent grant for `subject`, issued to `client_id`.
    pub fn new(subject: impl Into<String>, profile: Profile, client_id: impl Into<String>) -> Self {
        let subject = subject.into();

        MockGrant {
            access_token: format!("access-token-{}", subject),
            token_user_id: subject.clone(),
            subject,
            profile,
            issued_to: client_id.into(),
            token_error: None,
        }
    }
}

/// A scripted identity provider for tests.
#[derive(Default)]
pub struct MockProvider {
    client_id: String,
    grants: RwLock<HashMap<String, MockGrant>>,
    revoked: RwLock<Vec<String>>,
    fail_revocations: AtomicBool,
}

impl MockProvider {
    pub fn new(client_id: impl Into<String>) -> Self {
        MockProvider {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Makes `code` exchangeable for `grant`.
    pub fn grant(&self, code: impl Into<String>, grant: MockGrant) {
        self.grants.write().unwrap().insert(code.into(), grant);
    }

    pub fn fail_revocations(&self, fail: bool) {
        self.fail_revocations.store(fail, Ordering::SeqCst);
    }

    /// The access tokens revoked so far.
    pub fn revoked(&self) -> Vec<String> {
        self.revoked.read().unwrap().clone()
    }

    fn find_by_token(&self, access_token: &str) -> Option<MockGrant> {
        self.grants
            .read()
            .unwrap()
            .values()
            .find(|g| g.access_token == access_token)
            .cloned()
    }
}

impl IdentityProvider for MockProvider {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn exchange_code(&self, code: String) -> BoxFuture<'_, Result<Credentials, ProviderError>> {
        async move {
            let grant = self
                .grants
                .read()
                .unwrap()
                .get(&code)
                .cloned()
                .ok_or_else(|| ProviderError::ExchangeRefused("invalid_grant".to_owned()))?;

            Ok(Credentials {
                access_token: grant.access_token,
                subject: grant.subject,
            })
        }
        .boxed()
    }

    fn token_info(&self, access_token: String) -> BoxFuture<'_, Result<TokenInfo, ProviderError>> {
        async move {
            let info = match self.find_by_token(&access_token) {
                Some(grant) => match grant.token_error {
                    Some(error) => TokenInfo {
                        error: Some(error),
                        ..TokenInfo::default()
                    },
                    None => TokenInfo {
                        error: None,
                        user_id: Some(grant.token_user_id),
                        issued_to: Some(grant.issued_to),
                    },
                },
                None => TokenInfo {
                    error: Some("invalid_token".to_owned()),
                    ..TokenInfo::default()
                },
            };

            Ok(info)
        }
        .boxed()
    }

    fn user_info(&self, access_token: String) -> BoxFuture<'_, Result<Profile, ProviderError>> {
        async move {
            self.find_by_token(&access_token)
                .map(|grant| grant.profile)
                .ok_or_else(|| ProviderError::ExchangeRefused("unknown access token".to_owned()))
        }
        .boxed()
    }

    fn revoke(&self, access_token: String) -> BoxFuture<'_, Result<(), ProviderError>> {
        async move {
            if self.fail_revocations.load(Ordering::SeqCst) {
                return Err(ProviderError::RevocationFailed(400));
            }

            self.revoked.write().unwrap().push(access_token);
            Ok(())
        }
        .boxed()
    }
}
