//! Application users and login sessions.

use serde_json::{json, Value};
use std::fmt;
use tracing::info;

use crate::client::{ApiRequest, Client};
use crate::error::{Error, Result};
use crate::model::object::Object;
use crate::model::record::Record;
use crate::model::{take_root, Guarded, Model, Tagged};
use crate::util;
use crate::USER_CLASS_UID;

/// Root key of user payloads.
const USER_WRAPPER: &str = "application_user";

const USERS_URI: &str = "/application/users";

/// An application user: an object of the built-in user class.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    object: Object,
    authtoken: Option<String>,
}

impl User {
    /// A new, unsaved user.
    pub fn new() -> Self {
        Self::from_object(Object::of_builtin_class(USER_CLASS_UID))
    }

    /// A handle on an existing user.
    pub fn with_uid(uid: impl Into<String>) -> Self {
        let mut user = Self::new();
        let uid = uid.into();
        if !uid.is_empty() {
            let record = user.record_mut();
            record.set("uid", uid);
            record.mark_clean();
        }
        user
    }

    /// A user hydrated from a server payload.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let mut user = Self::new();
        user.hydrate(payload)?;
        Ok(user)
    }

    fn from_object(object: Object) -> Self {
        Self {
            object,
            authtoken: None,
        }
    }

    /// Wrap an object of the user class.
    pub fn try_from_object(object: Object) -> Result<Self> {
        if object.class_uid() != USER_CLASS_UID {
            return Err(Error::Validation(format!(
                "object of class {} is not an application user",
                object.class_uid()
            )));
        }
        Ok(Self::from_object(object))
    }

    /// The underlying object, for `sync`, `save` and `destroy`.
    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }

    pub fn email(&self) -> Option<&str> {
        self.record().get_str("email")
    }

    pub fn authtoken(&self) -> Option<&str> {
        self.authtoken.as_deref()
    }

    /// Assign the authtoken of this user.
    pub fn set_authtoken(&mut self, authtoken: Option<String>) {
        match &authtoken {
            Some(token) => self.set("authtoken", token.as_str()),
            None => {
                self.record_mut().delete("authtoken");
            }
        }
        self.authtoken = authtoken;
    }

    fn uri(&self) -> Result<String> {
        match self.uid() {
            Some(uid) if !uid.is_empty() => Ok(format!("{}/{}", USERS_URI, uid)),
            _ => Err(Error::UidNotSet),
        }
    }

    fn from_response(body: Value) -> Result<Self> {
        let payload = take_root(body, USER_WRAPPER)?;
        let authtoken = payload
            .get("authtoken")
            .and_then(Value::as_str)
            .map(String::from);
        let mut user = Self::from_payload(payload)?;
        user.authtoken = authtoken;
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// The user becomes the client's current user and its authtoken is sent
    /// with every further request.
    pub async fn login(client: &Client, email: &str, password: &str) -> Result<Self> {
        util::require("email", email)?;
        util::require("password", password)?;

        let request = ApiRequest::post(format!("{}/login", USERS_URI)).json(json!({
            USER_WRAPPER: {"email": email, "password": password}
        }));
        let user = Self::from_response(client.request_json(request).await?)?;

        let authtoken = user.authtoken.clone().ok_or_else(|| {
            Error::UnexpectedResponse("login response has no authtoken".to_string())
        })?;
        client.start_session(authtoken, user.clone()).await;
        info!("Logged in as {}", user.email().unwrap_or(email));

        Ok(user)
    }

    /// The logged-in user.
    ///
    /// Returns the cached user, or fetches the user owning the client's
    /// authtoken. `None` when there is no session.
    pub async fn current(client: &Client) -> Result<Option<Self>> {
        if let Some(user) = client.cached_user().await {
            return Ok(Some(user));
        }
        let authtoken = match client.authtoken().await {
            Some(token) => token,
            None => return Ok(None),
        };

        let body = client
            .request_json(ApiRequest::get(format!("{}/current", USERS_URI)))
            .await?;
        let mut user = Self::from_response(body)?;
        if user.authtoken.is_none() {
            user.authtoken = Some(authtoken);
        }
        client.set_current_user(Some(user.clone())).await;
        Ok(Some(user))
    }

    /// Generate an authtoken for the user with `email`.
    ///
    /// Needs the master key. The client's session is not touched.
    pub async fn generate_authtoken(client: &Client, email: &str) -> Result<Self> {
        util::require("email", email)?;
        if !client.has_master_key() {
            return Err(Error::Config(
                "generating an authtoken requires the master key".to_string(),
            ));
        }

        let request = ApiRequest::post(format!("{}/generate_authtoken", USERS_URI))
            .json(json!({ USER_WRAPPER: {"email": email} }));
        Self::from_response(client.request_json(request).await?)
    }

    /// End this user's session.
    ///
    /// # Errors
    ///
    /// [`Error::NotLoggedIn`] if this user's authtoken is not the client's
    /// active one; nothing is changed in that case.
    pub async fn logout(&mut self, client: &Client) -> Result<()> {
        let active = client.authtoken().await;
        match (&self.authtoken, &active) {
            (Some(mine), Some(theirs)) if mine == theirs => {}
            _ => return Err(Error::NotLoggedIn),
        }

        client
            .request(ApiRequest::delete(format!("{}/logout", USERS_URI)))
            .await?;

        client.end_session().await;
        self.authtoken = None;
        info!("Logged out {}", self.email().unwrap_or(""));
        Ok(())
    }

    /// Send the changed profile fields.
    pub async fn update_profile(&mut self, client: &Client) -> Result<()> {
        let request = ApiRequest::put(self.uri()?)
            .json(json!({ USER_WRAPPER: self.record().changed_values() }));
        let payload = take_root(client.request_json(request).await?, USER_WRAPPER)?;
        self.hydrate(payload)
    }

    /// Deactivate the user, then clear it locally.
    pub async fn deactivate(&mut self, client: &Client) -> Result<()> {
        client.request(ApiRequest::delete(self.uri()?)).await?;
        let record = self.record_mut();
        record.clear_all();
        record.mark_clean();
        self.authtoken = None;
        Ok(())
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for User {
    fn record(&self) -> &Record {
        self.object.record()
    }

    fn record_mut(&mut self) -> &mut Record {
        self.object.record_mut()
    }
}

impl Tagged for User {}

impl Guarded for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<User uid={}, email={}>",
            self.uid().unwrap_or(""),
            self.email().unwrap_or("")
        )
    }
}
