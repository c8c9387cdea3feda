//! Reads the source images a composition/video request references from
//! local disk (spec S3's `file_paths`).

use gateway_gax::GatewayError;

pub async fn read_all(paths: &[String]) -> Result<Vec<Vec<u8>>, GatewayError> {
    if paths.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "this operation requires at least one file path".into(),
        ));
    }
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GatewayError::InvalidRequest(format!("reading {path}: {e}")))?;
        out.push(bytes);
    }
    Ok(out)
}
