//! gRPC surface: profile streaming and transaction ingestion

use crate::director::Director;
use fraudguard_core::ProfileSet;
use fraudguard_proto::convert::{profile_from_proto, transaction_from_proto};
use fraudguard_proto::pb;
use fraudguard_proto::pb::profile_service_server::{ProfileService, ProfileServiceServer};
use fraudguard_proto::pb::transaction_service_server::{
    TransactionService, TransactionServiceServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

/// Receives profile streams; the whole stream is one atomic snapshot.
pub struct ProfileReceiver {
    director: Arc<Director>,
}

impl ProfileReceiver {
    pub fn new(director: Arc<Director>) -> Self {
        Self { director }
    }
}

#[tonic::async_trait]
impl ProfileService for ProfileReceiver {
    async fn process_profile_stream(
        &self,
        request: Request<Streaming<pb::Profile>>,
    ) -> Result<Response<pb::Empty>, Status> {
        let mut stream = request.into_inner();
        tracing::info!("profile stream opened");

        let mut profiles = ProfileSet::new();
        while let Some(message) = stream.message().await? {
            let profile = profile_from_proto(message)
                .map_err(|e| Status::invalid_argument(format!("invalid profile: {e}")))?;
            tracing::info!(uuid = %profile.uuid, name = %profile.name, "received profile");
            profiles.insert(profile);
        }
        tracing::info!(profiles = profiles.len(), "profile stream closed");

        self.director.refresh_profiles(profiles);
        Ok(Response::new(pb::Empty {}))
    }
}

/// Receives transactions; returns as soon as the fan-out is enqueued.
pub struct TransactionReceiver {
    director: Arc<Director>,
}

impl TransactionReceiver {
    pub fn new(director: Arc<Director>) -> Self {
        Self { director }
    }
}

#[tonic::async_trait]
impl TransactionService for TransactionReceiver {
    async fn process_transaction(
        &self,
        request: Request<pb::Transaction>,
    ) -> Result<Response<pb::Empty>, Status> {
        let transaction = transaction_from_proto(request.into_inner())
            .map_err(|e| Status::invalid_argument(format!("invalid transaction: {e}")))?;
        tracing::info!(transaction_id = %transaction.transaction_id, "received transaction");

        self.director.enqueue(transaction);
        Ok(Response::new(pb::Empty {}))
    }
}

/// Serve both services until the process is stopped.
pub async fn serve(director: Arc<Director>, addr: SocketAddr) -> Result<(), tonic::transport::Error> {
    tracing::info!(%addr, "starting gRPC server");
    tonic::transport::Server::builder()
        .add_service(ProfileServiceServer::new(ProfileReceiver::new(
            director.clone(),
        )))
        .add_service(TransactionServiceServer::new(TransactionReceiver::new(
            director,
        )))
        .serve(addr)
        .await
}
