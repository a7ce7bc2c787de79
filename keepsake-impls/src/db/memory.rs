use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossbeam::atomic::AtomicCell;
use dashmap::{mapref::entry::Entry, DashMap};

use keepsake_core::{
    CompletedUpload, Database, DatabaseError, NewOrder, NewSession, NewUser, OrderData,
    PrimaryKey, Result, SessionData, UserData,
};

/// A non-persistent database, for development and tests.
/// Everything is lost when the process exits.
#[derive(Default)]
pub struct MemoryDatabase {
    users: DashMap<PrimaryKey, UserData>,
    /// Username -> user id, doubles as the uniqueness constraint
    usernames: DashMap<String, PrimaryKey>,
    sessions: DashMap<String, SessionRecord>,
    orders: DashMap<String, OrderData>,
    last_user_id: AtomicCell<PrimaryKey>,
    last_session_id: AtomicCell<PrimaryKey>,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    id: PrimaryKey,
    user_id: PrimaryKey,
    expires_at: DateTime<Utc>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.users
            .get(&user_id)
            .map(|u| u.value().clone())
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        let user_id = self
            .usernames
            .get(username)
            .map(|id| *id.value())
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })?;

        self.user_by_id(user_id).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        match self.usernames.entry(new_user.username.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            }),
            Entry::Vacant(entry) => {
                let id = self.last_user_id.fetch_add(1) + 1;
                let user = UserData {
                    id,
                    username: new_user.username,
                    password: new_user.password,
                };

                self.users.insert(id, user.clone());
                entry.insert(id);

                Ok(user)
            }
        }
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let record = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        let user = self.user_by_id(record.user_id).await?;

        Ok(SessionData {
            id: record.id,
            token: token.to_string(),
            expires_at: record.expires_at,
            user,
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        // Ensure the user exists, like a foreign key would
        let _ = self.user_by_id(new_session.user_id).await?;

        match self.sessions.entry(new_session.token.clone()) {
            Entry::Occupied(_) => {
                return Err(DatabaseError::Conflict {
                    resource: "session",
                    field: "token",
                    value: new_session.token,
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(SessionRecord {
                    id: self.last_session_id.fetch_add(1) + 1,
                    user_id: new_session.user_id,
                    expires_at: new_session.expires_at,
                });
            }
        }

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        self.sessions.retain(|_, s| s.expires_at > now);

        Ok(())
    }

    async fn order_by_id(&self, order_id: &str) -> Result<OrderData> {
        self.orders
            .get(order_id)
            .map(|o| o.value().clone())
            .ok_or(DatabaseError::NotFound {
                resource: "order",
                identifier: "id",
            })
    }

    async fn list_orders(&self) -> Result<Vec<OrderData>> {
        let mut orders: Vec<_> = self.orders.iter().map(|o| o.value().clone()).collect();
        orders.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));

        Ok(orders)
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<OrderData> {
        match self.orders.entry(new_order.id.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Conflict {
                resource: "order",
                field: "id",
                value: new_order.id,
            }),
            Entry::Vacant(entry) => {
                let order = OrderData::new(new_order.id);
                entry.insert(order.clone());

                Ok(order)
            }
        }
    }

    async fn complete_upload(&self, upload: CompletedUpload) -> Result<OrderData> {
        let mut order =
            self.orders
                .get_mut(&upload.order_id)
                .ok_or(DatabaseError::NotFound {
                    resource: "order",
                    identifier: "id",
                })?;

        if order.has_uploaded {
            return Err(DatabaseError::Conflict {
                resource: "order upload",
                field: "id",
                value: upload.order_id,
            });
        }

        order.files = Some(upload.files);
        order.song_request = upload.song_request;
        order.has_uploaded = true;

        Ok(order.value().clone())
    }

    async fn delete_order(&self, order_id: &str) -> Result<()> {
        self.orders.remove(order_id);
        Ok(())
    }
}
