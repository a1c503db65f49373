use dashboard_ingest::source::HttpSource;
use dashboard_ingest::{FallbackTable, Loader, Registry, RetrievalError, Source, Tier, TierFailure};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// `(path, status, body)` answered by the test server; other paths are 404s.
type Route = (&'static str, u16, &'static str);

async fn serve(routes: Vec<Route>) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let _ = answer(stream, &routes).await;
            });
        }
    });
    Ok(addr)
}

async fn answer(mut stream: TcpStream, routes: &[Route]) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }
    let head = String::from_utf8_lossy(&head);
    let path = head.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = routes
        .iter()
        .find(|(p, _, _)| *p == path)
        .map(|(_, s, b)| (*s, *b))
        .unwrap_or((404, "not found"));
    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

#[tokio::test]
async fn success_returns_body() -> anyhow::Result<()> {
    let addr = serve(vec![("/data/tables/x.csv", 200, "a,b\n1,2\n")]).await?;
    let src = HttpSource::new(&format!("http://{addr}/data"))?;

    assert_eq!(src.fetch("tables/x.csv").await?, "a,b\n1,2\n");
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_a_retrieval_error() -> anyhow::Result<()> {
    let addr = serve(vec![("/data/tables/broken.csv", 500, "boom")]).await?;
    let src = HttpSource::new(&format!("http://{addr}/data"))?;

    assert!(matches!(
        src.fetch("tables/missing.csv").await,
        Err(RetrievalError::Status { status: 404, .. })
    ));
    assert!(matches!(
        src.fetch("tables/broken.csv").await,
        Err(RetrievalError::Status { status: 500, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let src = HttpSource::new(&format!("http://{addr}/"))?;
    assert!(matches!(
        src.fetch("tables/x.csv").await,
        Err(RetrievalError::Http(_))
    ));
    Ok(())
}

#[tokio::test]
async fn loader_cascades_over_http() -> anyhow::Result<()> {
    let addr = serve(vec![
        (
            "/site/tables/02_Reliabilitas_Aspek.csv",
            200,
            "Aspek,Omega\nOrder,0.84\nChange,0.79\n",
        ),
        ("/site/tables/35_Statistik_Deskriptif_Lengkap.csv", 500, ""),
    ])
    .await?;
    let source = Arc::new(HttpSource::new(&format!("http://{addr}/site"))?);
    let loader = Loader::new(source, Registry::builtin(), Arc::new(FallbackTable::builtin()))?;

    let reliability = loader.load("reliability").await?;
    assert_eq!(reliability.tier, Tier::Primary);
    assert_eq!(reliability.dataset.len(), 2);

    let descriptive = loader.load("descriptive").await?;
    assert_eq!(descriptive.tier, Tier::Fallback);
    let statuses: Vec<u16> = descriptive
        .failures
        .iter()
        .filter_map(|a| match &a.failure {
            TierFailure::Retrieval(RetrievalError::Status { status, .. }) => Some(*status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, [404, 500]);
    Ok(())
}
