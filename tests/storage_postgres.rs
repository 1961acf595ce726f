//! Repository behaviour against a real PostgreSQL instance.
//!
//! Run with: cargo test --features postgres_tests

#![cfg(feature = "postgres_tests")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::postgres::TestDatabase;
use socialfeed::auth::{hashing, token_codec, NewUser, Role};
use socialfeed::domain::{FeedQuery, NewPost, PostPatch, SortOrder, UserId};
use socialfeed::errors::{ConflictKind, Error};
use socialfeed::storage::{
    FollowRepository, PostRepository, RoleRepository, SqlxFollowRepository, SqlxPostRepository,
    SqlxRoleRepository, SqlxUserRepository, UserRepository,
};

const INVITATION_TTL: Duration = Duration::from_secs(3 * 24 * 3600);

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: hashing::hash_password("password123").unwrap(),
        role_name: Role::USER.to_string(),
    }
}

async fn verified_user(users: &SqlxUserRepository, email: &str) -> UserId {
    let token = token_codec::generate_plaintext();
    users.create_and_invite(new_user(email), &token, INVITATION_TTL).await.unwrap();
    users.activate(&token).await.unwrap()
}

fn conflict_kind(err: Error) -> ConflictKind {
    match err {
        Error::Conflict { kind } => kind,
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn roles_are_seeded_with_precedence() {
    let db = TestDatabase::new("roles_seeded").await;
    let roles = SqlxRoleRepository::new(db.pool.clone());

    let user = roles.get_by_name(Role::USER).await.unwrap();
    let moderator = roles.get_by_name(Role::MODERATOR).await.unwrap();
    let admin = roles.get_by_name(Role::ADMIN).await.unwrap();

    assert!(user.level < moderator.level && moderator.level < admin.level);
    assert!(roles.get_by_name("superuser").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn registration_stores_only_the_token_fingerprint() {
    let db = TestDatabase::new("fingerprint_only").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let token = token_codec::generate_plaintext();

    let user = users.create_and_invite(new_user("Mixed@Case.com"), &token, INVITATION_TTL).await.unwrap();
    assert_eq!(user.email, "mixed@case.com");
    assert!(!user.is_verified());

    let stored: String = sqlx::query_scalar("SELECT token_hash FROM invitations WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(stored, token_codec::fingerprint(&token));
    assert_ne!(stored, token);
}

#[tokio::test]
async fn duplicate_email_leaves_no_partial_rows() {
    let db = TestDatabase::new("duplicate_email").await;
    let users = SqlxUserRepository::new(db.pool.clone());

    users
        .create_and_invite(new_user("dup@example.com"), &token_codec::generate_plaintext(), INVITATION_TTL)
        .await
        .unwrap();
    let err = users
        .create_and_invite(new_user("DUP@example.com"), &token_codec::generate_plaintext(), INVITATION_TTL)
        .await
        .unwrap_err();
    assert_eq!(conflict_kind(err), ConflictKind::DuplicateEmail);

    let invitations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invitations")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(invitations, 1);
}

#[tokio::test]
async fn unverified_accounts_are_invisible_to_login_lookup() {
    let db = TestDatabase::new("unverified_login").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let token = token_codec::generate_plaintext();

    let user = users.create_and_invite(new_user("late@example.com"), &token, INVITATION_TTL).await.unwrap();
    assert!(users.get_by_email("late@example.com").await.unwrap_err().is_not_found());
    assert!(!users.get_by_id(user.id).await.unwrap().is_verified());

    users.activate(&token).await.unwrap();
    let credentials = users.get_by_email("LATE@example.com").await.unwrap();
    assert_eq!(credentials.user.id, user.id);
    assert!(credentials.user.is_verified());
    assert!(hashing::verify_password("password123", &credentials.password_hash).unwrap());
}

#[tokio::test]
async fn concurrent_activation_has_exactly_one_winner() {
    let db = TestDatabase::new("concurrent_activation").await;
    let users = Arc::new(SqlxUserRepository::new(db.pool.clone()));
    let token = token_codec::generate_plaintext();
    users.create_and_invite(new_user("race@example.com"), &token, INVITATION_TTL).await.unwrap();

    let attempts = (0..8).map(|_| {
        let users = users.clone();
        let token = token.clone();
        tokio::spawn(async move { users.activate(&token).await })
    });
    let outcomes = futures::future::join_all(attempts).await;

    let mut winners = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert!(err.is_not_found(), "unexpected error: {err:?}"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn expired_invitation_is_not_found_and_user_stays_unverified() {
    let db = TestDatabase::new("expired_invitation").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let token = token_codec::generate_plaintext();

    let user = users.create_and_invite(new_user("slow@example.com"), &token, INVITATION_TTL).await.unwrap();
    sqlx::query("UPDATE invitations SET expires_at = NOW() - INTERVAL '1 second'")
        .execute(&db.pool)
        .await
        .unwrap();

    assert!(users.activate(&token).await.unwrap_err().is_not_found());
    assert!(!users.get_by_id(user.id).await.unwrap().is_verified());
}

#[tokio::test]
async fn follow_constraints_are_classified() {
    let db = TestDatabase::new("follow_constraints").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let follows = SqlxFollowRepository::new(db.pool.clone());

    let alice = verified_user(&users, "alice@example.com").await;
    let bob = verified_user(&users, "bob@example.com").await;

    assert_eq!(conflict_kind(follows.follow(alice, alice).await.unwrap_err()), ConflictKind::SelfFollow);

    follows.follow(bob, alice).await.unwrap();
    assert_eq!(conflict_kind(follows.follow(bob, alice).await.unwrap_err()), ConflictKind::DuplicateFollow);

    assert!(follows.follow(UserId::new(999_999), alice).await.unwrap_err().is_not_found());

    follows.unfollow(bob, alice).await.unwrap();
    follows.unfollow(bob, alice).await.unwrap();
}

#[tokio::test]
async fn feed_filters_sorts_and_counts() {
    let db = TestDatabase::new("feed_query").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let follows = SqlxFollowRepository::new(db.pool.clone());
    let posts = SqlxPostRepository::new(db.pool.clone());

    let me = verified_user(&users, "me@example.com").await;
    let friend = verified_user(&users, "friend@example.com").await;
    let stranger = verified_user(&users, "stranger@example.com").await;
    follows.follow(friend, me).await.unwrap();

    let post = |user_id: UserId, title: &str, tags: &[&str]| NewPost {
        user_id,
        title: title.to_string(),
        content: format!("{} content", title),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };

    let mine = posts.create(post(me, "mine", &["rust"])).await.unwrap();
    let theirs = posts.create(post(friend, "Friend News", &["go"])).await.unwrap();
    posts.create(post(stranger, "stranger", &["rust"])).await.unwrap();

    sqlx::query("INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, 'hi'), ($1, $3, 'yo')")
        .bind(theirs.id)
        .bind(me)
        .bind(stranger)
        .execute(&db.pool)
        .await
        .unwrap();

    let feed = posts.feed(me, &FeedQuery::default()).await.unwrap();
    let ids: Vec<_> = feed.iter().map(|item| item.post.id).collect();
    assert_eq!(ids, vec![theirs.id, mine.id]);
    assert_eq!(feed[0].author_email, "friend@example.com");
    assert_eq!(feed[0].comments_count, 2);
    assert_eq!(feed[1].comments_count, 0);

    let ascending = FeedQuery { sort: SortOrder::Asc, ..FeedQuery::default() };
    let ids: Vec<_> = posts.feed(me, &ascending).await.unwrap().iter().map(|i| i.post.id).collect();
    assert_eq!(ids, vec![mine.id, theirs.id]);

    let tagged = FeedQuery { tags: vec!["rust".into()], ..FeedQuery::default() };
    let feed = posts.feed(me, &tagged).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].post.id, mine.id);

    let searched = FeedQuery { search: Some("news".into()), ..FeedQuery::default() };
    assert_eq!(posts.feed(me, &searched).await.unwrap()[0].post.id, theirs.id);

    for wildcard in ["%", "_"] {
        let literal = FeedQuery { search: Some(wildcard.into()), ..FeedQuery::default() };
        assert!(posts.feed(me, &literal).await.unwrap().is_empty(), "{wildcard} matched as a wildcard");
    }

    let paged = FeedQuery { limit: 1, offset: 1, ..FeedQuery::default() };
    assert_eq!(posts.feed(me, &paged).await.unwrap()[0].post.id, mine.id);
}

#[tokio::test]
async fn post_update_and_delete() {
    let db = TestDatabase::new("post_update").await;
    let users = SqlxUserRepository::new(db.pool.clone());
    let posts = SqlxPostRepository::new(db.pool.clone());
    let author = verified_user(&users, "author@example.com").await;

    let created = posts
        .create(NewPost { user_id: author, title: "t".into(), content: "c".into(), tags: vec![] })
        .await
        .unwrap();

    let updated = posts
        .update(created.id, &PostPatch { title: Some("new".into()), content: None })
        .await
        .unwrap();
    assert_eq!(updated.title, "new");
    assert_eq!(updated.content, "c");

    posts.delete(created.id).await.unwrap();
    assert!(posts.delete(created.id).await.unwrap_err().is_not_found());
    assert!(posts.get_by_id(created.id).await.unwrap_err().is_not_found());
}
