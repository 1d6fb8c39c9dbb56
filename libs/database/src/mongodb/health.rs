use mongodb::{Client, bson::doc};

/// Ping the server through the given database.
pub async fn ping(client: &Client, database: &str) -> Result<(), mongodb::error::Error> {
    client
        .database(database)
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_ping() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        assert!(ping(&client, "nft_test").await.is_ok());
    }

    #[tokio::test]
    async fn test_ping_unreachable_server_fails() {
        let client = Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200")
            .await
            .unwrap();
        assert!(ping(&client, "nft_test").await.is_err());
    }
}
