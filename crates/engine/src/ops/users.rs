use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, UserNew, users, users::User};

use super::{Engine, with_tx};

impl Engine {
    /// Register a user. Usernames are unique and compared verbatim.
    pub async fn create_user(&self, cmd: UserNew) -> ResultEngine<User> {
        let username = cmd.username.trim().to_string();
        if username.is_empty() {
            return Err(EngineError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if users::Entity::find()
                .filter(users::Column::Username.eq(&username))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username),
                password: ActiveValue::Set(cmd.password),
                is_superuser: ActiveValue::Set(cmd.is_superuser),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id = model.id, superuser = model.is_superuser, "user created");
            Ok(User::from(model))
        })
    }

    /// Resolve basic-auth credentials. `None` when they do not match a user.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        Ok(model
            .filter(|model| model.password == password)
            .map(User::from))
    }
}
