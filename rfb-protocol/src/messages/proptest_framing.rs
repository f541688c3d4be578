//! Property tests for handshake framing.
//!
//! These tests verify that handshake parsing is robust against fragmentation
//! at arbitrary byte boundaries, which is critical for correct operation over
//! real network streams.

#[cfg(test)]
mod tests {
    use super::super::server::FrameBufferInfo;
    use crate::handshake::Handshake;
    use crate::io::RfbStream;
    use proptest::prelude::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// A stream that hands out scripted server bytes at most `chunk` at a
    /// time and records everything the client writes.
    struct FragmentingStream {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        written: Vec<u8>,
    }

    impl FragmentingStream {
        fn new(data: Vec<u8>, chunk: usize) -> Self {
            Self {
                data,
                pos: 0,
                chunk: chunk.max(1),
                written: Vec::new(),
            }
        }
    }

    impl tokio::io::AsyncRead for FragmentingStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let available = (self.data.len() - self.pos)
                .min(self.chunk)
                .min(buf.remaining());

            let start = self.pos;
            buf.put_slice(&self.data[start..start + available]);
            self.pos += available;

            Poll::Ready(Ok(()))
        }
    }

    impl tokio::io::AsyncWrite for FragmentingStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            // Accept writes in fragments too
            let n = buf.len().min(self.chunk);
            self.written.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Debug, Clone)]
    struct ServerScript {
        minor: u8,
        offered: Vec<u8>,
        info: FrameBufferInfo,
    }

    impl ServerScript {
        fn server_bytes(&self) -> Vec<u8> {
            let mut bytes = format!("RFB 003.00{}\n", self.minor).into_bytes();
            if self.minor >= 7 {
                bytes.push(self.offered.len() as u8);
                bytes.extend_from_slice(&self.offered);
            } else {
                bytes.extend_from_slice(&1u32.to_be_bytes());
            }
            if self.minor >= 8 {
                bytes.extend_from_slice(&0u32.to_be_bytes());
            }
            bytes.extend_from_slice(&self.info.width.to_be_bytes());
            bytes.extend_from_slice(&self.info.height.to_be_bytes());
            bytes.extend_from_slice(&[0xCC; 16]);
            let name: Vec<u8> = self.info.server_name.chars().map(|c| c as u8).collect();
            bytes.extend_from_slice(&(name.len() as u32).to_be_bytes());
            bytes.extend_from_slice(&name);
            bytes
        }

        fn expected_client_bytes(&self) -> Vec<u8> {
            let mut bytes = format!("RFB 003.00{}\n", self.minor).into_bytes();
            if self.minor >= 7 {
                bytes.push(1); // None
            }
            bytes.push(0); // ClientInit, exclusive
            bytes
        }
    }

    fn arbitrary_script() -> impl Strategy<Value = ServerScript> {
        (
            prop::sample::select(vec![3u8, 7, 8]),
            prop::collection::vec(prop::sample::select(vec![0u8, 5, 16, 19, 30]), 0..6),
            1u16..=7680,
            1u16..=4320,
            "[\\x20-\\x7E\\xA0-\\xFF]{0,100}",
        )
            .prop_flat_map(|(minor, mut noise, width, height, name)| {
                noise.push(1);
                Just(noise)
                    .prop_shuffle()
                    .prop_map(move |offered| ServerScript {
                        minor,
                        offered,
                        info: FrameBufferInfo {
                            width,
                            height,
                            server_name: name.clone(),
                        },
                    })
            })
    }

    proptest! {
        /// The whole handshake parses identically however the bytes are split.
        #[test]
        fn test_handshake_fragmentation(
            script in arbitrary_script(),
            chunk in 1usize..32
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let stream = FragmentingStream::new(script.server_bytes(), chunk);
                let mut stream = RfbStream::new(stream);

                let info = Handshake::new().run(&mut stream).await.unwrap();
                prop_assert_eq!(&info, &script.info);

                let inner = stream.into_inner();
                prop_assert_eq!(inner.written, script.expected_client_bytes());
                prop_assert_eq!(inner.pos, inner.data.len());
                Ok(())
            })?;
        }

        /// Truncating the server script anywhere fails cleanly, never panics.
        #[test]
        fn test_truncated_handshake_fails(
            script in arbitrary_script(),
            cut in 0usize..200,
            chunk in 1usize..16
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let full = script.server_bytes();
                let cut = cut.min(full.len() - 1);
                let stream = FragmentingStream::new(full[..cut].to_vec(), chunk);
                let mut stream = RfbStream::new(stream);

                let result = Handshake::new().run(&mut stream).await;
                prop_assert!(result.is_err());
                Ok(())
            })?;
        }
    }
}
