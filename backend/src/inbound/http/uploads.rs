//! Multipart upload plumbing shared by the avatar and post-image endpoints.

use actix_multipart::Multipart;
use futures_util::StreamExt as _;

use crate::domain::Error;
use crate::domain::ports::IMAGE_MAX_BYTES;

/// Pull the first file field out of a multipart body.
///
/// Returns the client-supplied filename (used only for its extension) and the
/// file bytes. Non-file fields are skipped; the size cap is enforced while
/// streaming so an oversized upload is rejected without buffering it whole.
pub(crate) async fn read_image_field(payload: &mut Multipart) -> Result<(String, Vec<u8>), Error> {
    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|err| Error::invalid_request(format!("malformed multipart body: {err}")))?;

        let Some(filename) = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(ToOwned::to_owned)
        else {
            continue;
        };

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|err| Error::invalid_request(format!("upload stream failed: {err}")))?;
            if bytes.len() + chunk.len() > IMAGE_MAX_BYTES {
                return Err(Error::invalid_request(format!(
                    "image exceeds {IMAGE_MAX_BYTES} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((filename, bytes));
    }
    Err(Error::invalid_request("image file field missing"))
}
