use crate::application_impl::RealRelationshipService;
use crate::application_port::RelationshipService;
use crate::domain_model::FriendRequestInput;
use crate::domain_model::UserId;
use crate::domain_port::{StorageBackend, UserRecord};
use crate::infra_memory::{MemoryStore, memory_backend};
use uuid::Uuid;

pub fn uid(n: u128) -> UserId {
    UserId(Uuid::from_u128(n))
}

pub fn user_record(n: u128) -> UserRecord {
    UserRecord {
        user_id: uid(n),
        first_name: format!("first{n}"),
        last_name: format!("last{n}"),
        email: format!("user{n}@example.com"),
        avatar_url: Some(format!("https://cdn.example.com/avatars/{n}.png")),
        is_online: false,
    }
}

pub struct Graph {
    pub store: MemoryStore,
    pub backend: StorageBackend,
    pub service: RealRelationshipService,
}

/// A memory-backed graph with users `users`, each with an open ledger.
pub async fn graph(users: &[u128]) -> Graph {
    let store = MemoryStore::new();
    let backend = memory_backend(&store);
    graph_on(store, backend, users).await
}

pub async fn graph_on(store: MemoryStore, backend: StorageBackend, users: &[u128]) -> Graph {
    let service = RealRelationshipService::new(&backend, 3);
    for n in users {
        store.insert_user(user_record(*n)).await;
        service.create_ledger(uid(*n)).await.unwrap();
    }
    Graph {
        store,
        backend,
        service,
    }
}

/// Sends a request from `a` and has `b` accept it.
pub async fn befriend(g: &Graph, a: u128, b: u128) {
    let request = g
        .service
        .send_request(FriendRequestInput {
            sender: uid(a),
            receiver: uid(b),
        })
        .await
        .unwrap();
    g.service
        .accept_request(uid(b), request.request_id)
        .await
        .unwrap();
}
