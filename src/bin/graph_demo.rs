//! Walks the friend-request lifecycle and the friend feed against the
//! in-memory backend. No database needed:
//!
//! $ cargo run --bin graph_demo

use chrono::{Duration, Utc};
use socialgraph::application_port::*;
use socialgraph::domain_model::*;
use socialgraph::domain_port::UserRecord;
use socialgraph::infra_memory::MemoryStore;
use socialgraph::logger::*;
use socialgraph::server::Server;

fn demo_user(name: &str) -> UserRecord {
    UserRecord {
        user_id: UserId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes())),
        first_name: name.to_owned(),
        last_name: "Demo".to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        avatar_url: None,
        is_online: true,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload("debug")?;

    let store = MemoryStore::new();
    let server = Server::in_memory(&store);
    let graph = server.relationship_service.clone();
    let feed = server.feed_service.clone();

    let alice = demo_user("Alice");
    let bob = demo_user("Bob");
    let carol = demo_user("Carol");
    for user in [&alice, &bob, &carol] {
        store.insert_user(user.clone()).await;
        graph.create_ledger(user.user_id).await?;
    }

    // region request lifecycle

    let request = graph
        .send_request(FriendRequestInput {
            sender: alice.user_id,
            receiver: bob.user_id,
        })
        .await?;
    info!("alice -> bob: {}", request.request_id);

    let reverse = graph
        .send_request(FriendRequestInput {
            sender: bob.user_id,
            receiver: alice.user_id,
        })
        .await;
    info!("bob -> alice while pending: {:?}", reverse.err());

    graph.accept_request(bob.user_id, request.request_id).await?;
    let conversation = graph.find_conversation(alice.user_id, bob.user_id).await?;
    info!("conversation after accept: {:?}", conversation.map(|c| c.conversation_id));

    let to_carol = graph
        .send_request(FriendRequestInput {
            sender: carol.user_id,
            receiver: alice.user_id,
        })
        .await?;
    for pending in graph.find_requests(alice.user_id).await? {
        info!(
            "alice has a pending request from {} {}",
            pending.counterpart.first_name, pending.counterpart.last_name
        );
    }
    graph.decline_request(alice.user_id, to_carol.request_id).await?;

    // endregion

    // region feed

    let start = Utc::now() - Duration::hours(1);
    for (i, author) in [&alice, &bob, &carol, &bob].iter().enumerate() {
        store
            .insert_post(
                author.user_id,
                &format!("{} says hi #{i}", author.first_name),
                start + Duration::minutes(i as i64),
            )
            .await;
    }

    let page = feed.find_feed(alice.user_id, None).await?;
    for post in &page.items {
        info!("alice's feed: {}", post.content);
    }
    if let Some(first) = page.items.first() {
        feed.add_like(first.post_id, alice.user_id).await?;
    }

    // endregion

    let ledger = graph.remove_friend(alice.user_id, bob.user_id).await?;
    info!(
        "alice's friends after removal: {:?}, conversations left: {}",
        ledger.friends,
        store.conversation_count().await
    );

    Ok(())
}
