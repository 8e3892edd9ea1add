//! Classification of reqwest transport failures.

use crate::{Error, ErrorKind};

/// Maps a reqwest failure onto the client's [`ErrorKind`] taxonomy.
///
/// Refused or unreachable connections become [`ErrorKind::NetworkError`],
/// which is the only kind the offline fallback reacts to.
pub(crate) fn classify(err: ::reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::NetworkError
    } else if err.is_decode() || err.is_body() {
        ErrorKind::Serialization
    } else {
        ErrorKind::NetworkError
    };

    let message = match kind {
        ErrorKind::NetworkError if err.is_connect() => "Backend is unreachable".to_owned(),
        _ => err.to_string(),
    };

    Error::new(kind).with_message(message).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ::reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap_err();
        let err = classify(err);
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert_eq!(err.message(), "Backend is unreachable");
    }
}
