use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn reply<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(data))
}

// region friends

pub async fn list_friends(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friends = relationship_service
        .find_friends(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(friends))
}

pub async fn list_online_friends(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friends = relationship_service
        .find_friends_online(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(friends))
}

pub async fn list_requests(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = relationship_service
        .find_requests(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(requests))
}

pub async fn list_sent(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requests = relationship_service
        .find_sent(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(requests))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SendRequestBody {
    pub receiver: UserId,
}

pub async fn send_request(
    body: SendRequestBody,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = FriendRequestInput {
        sender: user_id,
        receiver: body.receiver,
    };
    let request = relationship_service
        .send_request(input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::with_status(
        reply(request),
        warp::http::StatusCode::CREATED,
    ))
}

pub async fn accept_request(
    request_id: FriendRequestId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .accept_request(user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(request))
}

pub async fn decline_request(
    request_id: FriendRequestId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .decline_request(user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(request))
}

pub async fn remove_friend(
    friend_id: UserId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ledger = relationship_service
        .remove_friend(user_id, friend_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(ledger))
}

// endregion

// region posts

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<PostId>,
}

pub async fn feed(
    query: PageQuery,
    user_id: UserId,
    feed_service: Arc<dyn FeedService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = feed_service
        .find_feed(user_id, query.cursor)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(page))
}

pub async fn all_posts(
    query: PageQuery,
    _user_id: UserId,
    feed_service: Arc<dyn FeedService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = feed_service
        .find_all(query.cursor)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(page))
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub post_id: PostId,
    pub liked: bool,
}

pub async fn like(
    post_id: PostId,
    user_id: UserId,
    feed_service: Arc<dyn FeedService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    feed_service
        .add_like(post_id, user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(LikeResponse {
        post_id,
        liked: true,
    }))
}

pub async fn unlike(
    post_id: PostId,
    user_id: UserId,
    feed_service: Arc<dyn FeedService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    feed_service
        .remove_like(post_id, user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply(LikeResponse {
        post_id,
        liked: false,
    }))
}

// endregion
