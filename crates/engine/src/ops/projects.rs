use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Allocator, EngineError, Fund, Project, ProjectNew, ProjectUpdate, ResultEngine,
    SeaRepository, projects,
    util::{
        normalize_description, normalize_project_name, project_name_key, require_positive_amount,
    },
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_project(
        &self,
        db: &DatabaseTransaction,
        project_id: i64,
    ) -> ResultEngine<projects::Model> {
        projects::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("project not exists".to_string()))
    }

    /// Fails with `ExistingKey` if another project already uses `name_key`.
    async fn ensure_unique_name(
        &self,
        db: &DatabaseTransaction,
        name: &str,
        name_key: &str,
        except: Option<i64>,
    ) -> ResultEngine<()> {
        let mut query = projects::Entity::find().filter(projects::Column::NameKey.eq(name_key));
        if let Some(id) = except {
            query = query.filter(projects::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Create a project and fund it from the open donations, oldest first.
    ///
    /// Returns the project as stored after the allocation pass.
    pub async fn create_project(&self, cmd: ProjectNew) -> ResultEngine<Project> {
        let name = normalize_project_name(&cmd.name)?;
        let name_key = project_name_key(&name);
        let description = normalize_description(&cmd.description)?;
        require_positive_amount(cmd.target_amount, "target_amount")?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.ensure_unique_name(&db_tx, &name, &name_key, None)
                .await?;

            let model = projects::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                name_key: ActiveValue::Set(name_key),
                description: ActiveValue::Set(description),
                target_amount: ActiveValue::Set(cmd.target_amount),
                invested_amount: ActiveValue::Set(0),
                fully_funded: ActiveValue::Set(false),
                created_at: ActiveValue::Set(now),
                closed_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(project_id = model.id, target = model.target_amount, "project created");

            let repository = SeaRepository::new(&db_tx);
            let mut fund = Fund::from(&model);
            Allocator::new(&repository)
                .allocate_open(&mut fund, now)
                .await?;

            let project = self.require_project(&db_tx, model.id).await?;
            Ok(Project::from(project))
        })
    }

    /// Edit a project that is still open.
    ///
    /// The new target may not go below the amount already invested. Reaching
    /// the target exactly closes the project. Edits never start an allocation
    /// pass.
    pub async fn update_project(
        &self,
        project_id: i64,
        cmd: ProjectUpdate,
    ) -> ResultEngine<Project> {
        if cmd.is_empty() {
            return Err(EngineError::InvalidInput("nothing to update".to_string()));
        }
        let name = cmd.name.as_deref().map(normalize_project_name).transpose()?;
        let description = cmd
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;
        if let Some(target) = cmd.target_amount {
            require_positive_amount(target, "target_amount")?;
        }
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            if model.fully_funded {
                return Err(EngineError::ProjectClosed(
                    "cannot edit a fully funded project".to_string(),
                ));
            }
            if let Some(target) = cmd.target_amount
                && target < model.invested_amount
            {
                return Err(EngineError::InvalidAmount(format!(
                    "target_amount must not be below the invested amount ({})",
                    model.invested_amount
                )));
            }

            let mut active: projects::ActiveModel = model.clone().into();
            if let Some(name) = name {
                let name_key = project_name_key(&name);
                self.ensure_unique_name(&db_tx, &name, &name_key, Some(project_id))
                    .await?;
                active.name = ActiveValue::Set(name);
                active.name_key = ActiveValue::Set(name_key);
            }
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(target) = cmd.target_amount {
                active.target_amount = ActiveValue::Set(target);
                if target == model.invested_amount {
                    active.fully_funded = ActiveValue::Set(true);
                    active.closed_at = ActiveValue::Set(Some(now));
                    tracing::info!(project_id, "project closed by target edit");
                }
            }

            let model = active.update(&db_tx).await?;
            Ok(Project::from(model))
        })
    }

    /// Delete a project that never received money.
    pub async fn delete_project(&self, project_id: i64) -> ResultEngine<Project> {
        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            if model.invested_amount > 0 {
                return Err(EngineError::HasInvestments(format!(
                    "project {project_id} already received {}",
                    model.invested_amount
                )));
            }
            projects::Entity::delete_by_id(project_id)
                .exec(&db_tx)
                .await?;
            Ok(Project::from(model))
        })
    }

    pub async fn project(&self, project_id: i64) -> ResultEngine<Project> {
        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            Ok(Project::from(model))
        })
    }

    /// All projects, oldest first.
    pub async fn projects(&self) -> ResultEngine<Vec<Project>> {
        let models = projects::Entity::find()
            .order_by_asc(projects::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Project::from).collect())
    }
}
