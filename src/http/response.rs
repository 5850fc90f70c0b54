use std::io::{BufRead, Read};

use crate::error::{Error, Result};

/// Upper bound on a response body; RPC replies are small.
const MAX_BODY: usize = 10 * 1024 * 1024;

/// Upper bound on a response head, and on a CONNECT reply.
const MAX_HEAD: usize = 8192;

/// A parsed HTTP/1.x response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Whether the connection may carry another request.
    pub keep_alive: bool,
}

impl HttpResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Parse the status line of an HTTP response.
///
/// # Arguments
///
/// * `line` - The first line of the response, without its terminator.
///
/// # Returns
///
/// * `Result<(String, u16, String)>` - Version, status code and reason phrase.
pub fn parse_status_line(line: &str) -> Result<(String, u16, String)> {
    let mut parts = line.trim_end().splitn(3, ' ');
    let version = parts
        .next()
        .filter(|v| v.starts_with("HTTP/"))
        .ok_or_else(|| Error::InvalidResponse(format!("Invalid status line \"{}\"", line)))?;
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| Error::InvalidResponse(format!("Invalid status code in \"{}\"", line)))?;
    let reason = parts.next().unwrap_or("").to_string();

    Ok((version.to_string(), status, reason))
}

/// Read one complete response from a connection.
///
/// The body is delimited by `Content-Length`, by chunked transfer coding, or
/// by the peer closing the connection; only the first two leave the
/// connection reusable.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<HttpResponse> {
    let status_line = read_line(reader)?;
    if status_line.is_empty() {
        return Err(Error::InvalidResponse(
            "Connection closed before a response was received".to_string(),
        ));
    }
    let (version, status, reason) = parse_status_line(&status_line)?;

    let mut headers = Vec::new();
    let mut head_len = status_line.len();
    loop {
        let line = read_line(reader)?;
        head_len += line.len();
        if head_len > MAX_HEAD {
            return Err(Error::InvalidResponse("Response headers too large".to_string()));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let mut response = HttpResponse {
        version,
        status,
        reason,
        headers,
        body: Vec::new(),
        keep_alive: false,
    };

    let connection = response.header("Connection").map(str::to_ascii_lowercase);
    let persistent = match connection.as_deref() {
        Some(value) if value.contains("close") => false,
        Some(value) if value.contains("keep-alive") => true,
        _ => response.version != "HTTP/1.0",
    };

    let chunked = response
        .header("Transfer-Encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let content_length = response
        .header("Content-Length")
        .and_then(|value| value.parse::<usize>().ok());

    if chunked {
        response.body = read_chunked(reader)?;
        response.keep_alive = persistent;
    } else if let Some(length) = content_length {
        if length > MAX_BODY {
            return Err(Error::InvalidResponse(format!(
                "Response too large ({} bytes)",
                length
            )));
        }
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        response.body = body;
        response.keep_alive = persistent;
    } else {
        let mut body = Vec::new();
        reader
            .by_ref()
            .take(MAX_BODY as u64 + 1)
            .read_to_end(&mut body)?;
        if body.len() > MAX_BODY {
            return Err(Error::InvalidResponse("Response too large".to_string()));
        }
        response.body = body;
    }

    Ok(response)
}

/// Read a CONNECT reply head, byte by byte so nothing past the blank line
/// is consumed from the tunnel.
pub fn read_connect_reply<R: Read>(stream: &mut R) -> Result<String> {
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") && !head.ends_with(b"\n\n") {
        if stream.read(&mut byte)? == 0 {
            break;
        }
        head.push(byte[0]);
        if head.len() > MAX_HEAD {
            break;
        }
    }

    if head.is_empty() {
        return Err(Error::InvalidResponse(
            "Proxy closed the connection without replying".to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = Vec::new();
    reader
        .by_ref()
        .take(MAX_HEAD as u64)
        .read_until(b'\n', &mut line)?;
    Ok(String::from_utf8_lossy(&line).into_owned())
}

fn read_chunked<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    loop {
        let size_line = read_line(reader)?;
        let size_field = size_line.trim().split(';').next().unwrap_or("");
        let size = usize::from_str_radix(size_field, 16).map_err(|_| {
            Error::InvalidResponse(format!("Invalid chunk size \"{}\"", size_line.trim()))
        })?;

        if size == 0 {
            // Trailer section, terminated by an empty line.
            loop {
                let trailer = read_line(reader)?;
                if trailer.trim().is_empty() {
                    break;
                }
            }
            return Ok(body);
        }

        if size > MAX_BODY - body.len() {
            return Err(Error::InvalidResponse("Response too large".to_string()));
        }

        let start = body.len();
        body.resize(start + size, 0);
        reader.read_exact(&mut body[start..])?;
        read_line(reader)?;
    }
}
