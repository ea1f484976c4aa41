use super::error::*;
use super::handler;
use super::handler::PageQuery;
use crate::application_port::TokenVerifier;
use crate::domain_model::{FriendRequestId, PostId, UserId};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let auth = with_verification(server.token_verifier.clone());
    let relationships = with(server.relationship_service.clone());
    let feed = with(server.feed_service.clone());

    let friends = warp::get()
        .and(warp::path!("friends"))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::list_friends);

    let online_friends = warp::get()
        .and(warp::path!("friends" / "online"))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::list_online_friends);

    let received_requests = warp::get()
        .and(warp::path!("friends" / "requests"))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::list_requests);

    let sent_requests = warp::get()
        .and(warp::path!("friends" / "sent"))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::list_sent);

    let send_request = warp::post()
        .and(warp::path!("friends" / "requests"))
        .and(warp::body::json())
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::send_request);

    let accept_request = warp::post()
        .and(warp::path!("friends" / "requests" / FriendRequestId / "accept"))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::accept_request);

    let decline_request = warp::delete()
        .and(warp::path!("friends" / "requests" / FriendRequestId))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::decline_request);

    let remove_friend = warp::delete()
        .and(warp::path!("friends" / UserId))
        .and(auth.clone())
        .and(relationships.clone())
        .and_then(handler::remove_friend);

    let friend_feed = warp::get()
        .and(warp::path!("feed"))
        .and(warp::query::<PageQuery>())
        .and(auth.clone())
        .and(feed.clone())
        .and_then(handler::feed);

    let all_posts = warp::get()
        .and(warp::path!("posts"))
        .and(warp::query::<PageQuery>())
        .and(auth.clone())
        .and(feed.clone())
        .and_then(handler::all_posts);

    let like = warp::post()
        .and(warp::path!("posts" / PostId / "like"))
        .and(auth.clone())
        .and(feed.clone())
        .and_then(handler::like);

    let unlike = warp::delete()
        .and(warp::path!("posts" / PostId / "like"))
        .and(auth)
        .and(feed)
        .and_then(handler::unlike);

    friends
        .or(online_friends)
        .or(received_requests)
        .or(sent_requests)
        .or(send_request)
        .or(accept_request)
        .or(decline_request)
        .or(remove_friend)
        .or(friend_feed)
        .or(all_posts)
        .or(like)
        .or(unlike)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    token_verifier: Arc<dyn TokenVerifier>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_verifier = token_verifier.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = token_verifier
                    .verify(token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiError::new(
                    ApiErrorCode::InvalidToken,
                    "expected a bearer token",
                )))
            }
        }
    })
}
