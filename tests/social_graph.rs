use chrono::{Duration, Utc};
use socialgraph::application_port::*;
use socialgraph::domain_model::*;
use socialgraph::domain_port::UserRecord;
use socialgraph::infra_memory::MemoryStore;
use socialgraph::server::Server;
use std::sync::Arc;
use uuid::Uuid;

fn uid(n: u128) -> UserId {
    UserId(Uuid::from_u128(n))
}

async fn setup(users: &[u128]) -> (Arc<Server>, MemoryStore) {
    let store = MemoryStore::new();
    let server = Arc::new(Server::in_memory(&store));
    for n in users {
        store
            .insert_user(UserRecord {
                user_id: uid(*n),
                first_name: format!("first{n}"),
                last_name: format!("last{n}"),
                email: format!("user{n}@example.com"),
                avatar_url: None,
                is_online: *n % 2 == 0,
            })
            .await;
        server
            .relationship_service
            .create_ledger(uid(*n))
            .await
            .unwrap();
    }
    (server, store)
}

async fn send(server: &Server, sender: u128, receiver: u128) -> Result<FriendRequest, RelationError> {
    server
        .relationship_service
        .send_request(FriendRequestInput {
            sender: uid(sender),
            receiver: uid(receiver),
        })
        .await
}

#[tokio::test]
async fn friendship_lifecycle() {
    let (server, store) = setup(&[1, 2, 3]).await;
    let graph = &server.relationship_service;

    let request = send(&server, 1, 2).await.unwrap();
    assert_eq!(graph.find_sent(uid(1)).await.unwrap().len(), 1);
    assert_eq!(graph.find_requests(uid(2)).await.unwrap().len(), 1);

    let accepted = graph.accept_request(uid(2), request.request_id).await.unwrap();
    assert!(accepted.accepted);
    assert!(graph.are_friends(uid(1), uid(2)).await.unwrap());
    assert!(graph.are_friends(uid(2), uid(1)).await.unwrap());
    assert!(graph.find_requests(uid(2)).await.unwrap().is_empty());

    let conversation = graph.find_conversation(uid(2), uid(1)).await.unwrap().unwrap();
    assert_eq!(conversation.members.len(), 2);
    assert_eq!(store.conversation_count().await, 1);

    // uid(2) is online, uid(3) is not.
    send(&server, 3, 1).await.unwrap();
    let from_three = graph.find_requests(uid(1)).await.unwrap().remove(0);
    graph
        .accept_request(uid(1), from_three.request.request_id)
        .await
        .unwrap();
    let friends: Vec<UserId> = graph
        .find_friends(uid(1))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.user_id)
        .collect();
    assert_eq!(friends, vec![uid(2), uid(3)]);
    let online = graph.find_friends_online(uid(1)).await.unwrap();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].user_id, uid(2));

    let ledger = graph.remove_friend(uid(2), uid(1)).await.unwrap();
    assert!(ledger.friends.is_empty());
    assert!(!graph.are_friends(uid(1), uid(2)).await.unwrap());
    assert!(graph.find_conversation(uid(1), uid(2)).await.unwrap().is_none());
    assert_eq!(store.conversation_count().await, 1);

    // The pair can start over once the friendship is gone.
    send(&server, 2, 1).await.unwrap();
}

#[tokio::test]
async fn requests_racing_from_both_sides_leave_one() {
    let (server, _store) = setup(&[1, 2]).await;

    let (a, b) = tokio::join!(send(&server, 1, 2), send(&server, 2, 1));
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = a.err().or(b.err()).unwrap();
    assert_eq!(loser, RelationError::Conflict("request_outstanding"));

    let pending = server.relationship_service.find_requests(uid(1)).await.unwrap().len()
        + server.relationship_service.find_requests(uid(2)).await.unwrap().len();
    assert_eq!(pending, 1);
}

#[tokio::test]
async fn feed_follows_the_friend_graph() {
    let (server, store) = setup(&[1, 2, 3]).await;
    let graph = &server.relationship_service;
    let feed = &server.feed_service;

    let request = send(&server, 1, 2).await.unwrap();
    graph.accept_request(uid(2), request.request_id).await.unwrap();

    let start = Utc::now() - Duration::hours(1);
    for i in 0..12 {
        let author = uid(1 + (i % 3) as u128);
        store
            .insert_post(author, &format!("post {i}"), start + Duration::minutes(i))
            .await;
    }

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = feed.find_feed(uid(1), cursor).await.unwrap();
        seen.extend(page.items.iter().map(|p| p.author_id));
        if !page.has_next_page {
            break;
        }
        cursor = page.next_cursor;
    }
    assert_eq!(seen.len(), 8);
    assert!(!seen.contains(&uid(3)));

    let everything = feed.find_all(None).await.unwrap();
    assert_eq!(everything.items.len(), 10);
    assert!(everything.has_next_page);
    let newest = everything.items[0].post_id;

    feed.add_like(newest, uid(3)).await.unwrap();
    assert_eq!(
        feed.add_like(newest, uid(3)).await,
        Err(FeedError::Conflict("already_liked"))
    );
    let top = feed.find_all(None).await.unwrap().items.remove(0);
    assert_eq!(top.like_count, 1);

    graph.remove_friend(uid(1), uid(2)).await.unwrap();
    let page = feed.find_feed(uid(1), None).await.unwrap();
    assert!(page.items.iter().all(|p| p.author_id == uid(1)));
    assert_eq!(page.items.len(), 4);
}
