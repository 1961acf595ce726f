//! In-memory repository doubles mirroring the PostgreSQL constraints.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use socialfeed::auth::{hashing, token_codec, NewUser, Role, RoleLevel, User, UserCredentials};
use socialfeed::domain::{
    Comment, CommentAuthor, CommentId, FeedItem, FeedQuery, NewPost, Post, PostId, PostPatch,
    RoleId, SortOrder, UserId,
};
use socialfeed::errors::{ConflictKind, Error, Result};
use socialfeed::storage::{
    CommentRepository, FollowRepository, PostRepository, RoleRepository, UserRepository,
};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct Invitation {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    roles: Vec<Role>,
    users: BTreeMap<UserId, StoredUser>,
    invitations: HashMap<String, Invitation>,
    follows: HashSet<(UserId, UserId)>,
    posts: BTreeMap<PostId, Post>,
    comments: Vec<Comment>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn role(&self, name: &str) -> Result<Role> {
        self.roles
            .iter()
            .find(|role| role.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("role", name))
    }
}

/// One store implementing every repository trait.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Store with the three standard roles.
    pub fn seeded() -> Self {
        let roles = [(1, Role::USER, 1), (2, Role::MODERATOR, 2), (3, Role::ADMIN, 3)]
            .into_iter()
            .map(|(id, name, level)| Role {
                id: RoleId::new(id),
                name: name.to_string(),
                level: RoleLevel(level),
                description: None,
            })
            .collect();

        Self { state: Mutex::new(State { roles, ..Default::default() }) }
    }

    /// Insert an account directly, bypassing the invitation flow.
    pub fn seed_user(&self, email: &str, password: &str, role_name: &str, verified: bool) -> User {
        let password_hash = hashing::hash_password(password).unwrap();
        let mut state = self.state.lock().unwrap();
        let role = state.role(role_name).unwrap();
        let id = UserId::new(state.next_id());
        let now = Utc::now();
        let user = User {
            id,
            email: User::normalize_email(email),
            email_verified_at: verified.then_some(now),
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, StoredUser { user: user.clone(), password_hash });
        user
    }

    pub fn remove_user(&self, id: UserId) {
        self.state.lock().unwrap().users.remove(&id);
    }

    /// Move an invitation's expiry into the past.
    pub fn expire_invitations(&self) {
        let mut state = self.state.lock().unwrap();
        for invitation in state.invitations.values_mut() {
            invitation.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    pub fn invitation_count(&self) -> usize {
        self.state.lock().unwrap().invitations.len()
    }

    pub fn add_comment(&self, post_id: PostId, author: &User, content: &str) -> Comment {
        let mut state = self.state.lock().unwrap();
        let comment = Comment {
            id: CommentId::new(state.next_id()),
            post_id,
            user_id: author.id,
            content: content.to_string(),
            created_at: Utc::now(),
            author: CommentAuthor { id: author.id, email: author.email.clone() },
        };
        state.comments.push(comment.clone());
        comment
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_and_invite(
        &self,
        user: NewUser,
        plaintext_token: &str,
        invitation_ttl: Duration,
    ) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let email = User::normalize_email(&user.email);
        if state.users.values().any(|stored| stored.user.email == email) {
            return Err(Error::conflict(ConflictKind::DuplicateEmail));
        }

        let role = state.role(&user.role_name)?;
        let id = UserId::new(state.next_id());
        let now = Utc::now();
        let created = User {
            id,
            email,
            email_verified_at: None,
            role,
            created_at: now,
            updated_at: now,
        };

        state
            .users
            .insert(id, StoredUser { user: created.clone(), password_hash: user.password_hash });
        state.invitations.insert(
            token_codec::fingerprint(plaintext_token),
            Invitation {
                user_id: id,
                expires_at: now + chrono::Duration::from_std(invitation_ttl).unwrap(),
            },
        );

        Ok(created)
    }

    async fn activate(&self, plaintext_token: &str) -> Result<UserId> {
        let mut state = self.state.lock().unwrap();
        let key = token_codec::fingerprint(plaintext_token);

        let user_id = match state.invitations.get(&key) {
            Some(invitation) if invitation.expires_at > Utc::now() => invitation.user_id,
            _ => return Err(Error::not_found("invitation", "token")),
        };

        state.invitations.retain(|_, invitation| invitation.user_id != user_id);
        if let Some(stored) = state.users.get_mut(&user_id) {
            stored.user.email_verified_at = Some(Utc::now());
        }

        Ok(user_id)
    }

    async fn get_by_email(&self, email: &str) -> Result<UserCredentials> {
        let email = User::normalize_email(email);
        let state = self.state.lock().unwrap();
        state
            .users
            .values()
            .find(|stored| stored.user.email == email && stored.user.is_verified())
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            })
            .ok_or_else(|| Error::not_found("user", "email"))
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        let state = self.state.lock().unwrap();
        state
            .users
            .get(&id)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| Error::not_found("user", id.to_string()))
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn get_by_name(&self, name: &str) -> Result<Role> {
        self.state.lock().unwrap().role(name)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn follow(&self, followed_id: UserId, follower_id: UserId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if followed_id == follower_id {
            return Err(Error::conflict(ConflictKind::SelfFollow));
        }
        if !state.users.contains_key(&followed_id) {
            return Err(Error::not_found("user", "followed"));
        }
        if !state.follows.insert((followed_id, follower_id)) {
            return Err(Error::conflict(ConflictKind::DuplicateFollow));
        }
        Ok(())
    }

    async fn unfollow(&self, followed_id: UserId, follower_id: UserId) -> Result<()> {
        self.state.lock().unwrap().follows.remove(&(followed_id, follower_id));
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let created = Post {
            id: PostId::new(state.next_id()),
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            tags: post.tags,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        };
        state.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: PostId) -> Result<Post> {
        let state = self.state.lock().unwrap();
        state.posts.get(&id).cloned().ok_or_else(|| Error::not_found("post", id.to_string()))
    }

    async fn update(&self, id: PostId, patch: &PostPatch) -> Result<Post> {
        let mut state = self.state.lock().unwrap();
        let post = state.posts.get_mut(&id).ok_or_else(|| Error::not_found("post", id.to_string()))?;
        patch.apply(post);
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: PostId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.posts.remove(&id).ok_or_else(|| Error::not_found("post", id.to_string()))?;
        state.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }

    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>> {
        let state = self.state.lock().unwrap();
        let search = query.search.as_ref().map(|s| s.to_lowercase());

        let mut items: Vec<FeedItem> = state
            .posts
            .values()
            .filter(|post| {
                post.user_id == user_id || state.follows.contains(&(post.user_id, user_id))
            })
            .filter(|post| query.tags.is_empty() || post.tags.iter().any(|t| query.tags.contains(t)))
            .filter(|post| match &search {
                Some(needle) => {
                    post.title.to_lowercase().contains(needle)
                        || post.content.to_lowercase().contains(needle)
                }
                None => true,
            })
            .map(|post| FeedItem {
                post: post.clone(),
                author_email: state
                    .users
                    .get(&post.user_id)
                    .map(|stored| stored.user.email.clone())
                    .unwrap_or_default(),
                comments_count: state.comments.iter().filter(|c| c.post_id == post.id).count()
                    as i64,
            })
            .collect();

        items.sort_by_key(|item| (item.post.created_at, item.post.id));
        if query.sort == SortOrder::Desc {
            items.reverse();
        }

        Ok(items
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn get_by_post_id(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<Comment> =
            state.comments.iter().filter(|c| c.post_id == post_id).cloned().collect();
        comments.sort_by_key(|c| std::cmp::Reverse((c.created_at, c.id)));
        Ok(comments)
    }
}
