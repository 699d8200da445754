use std::io::{self, Read};

/// Ленивое чтение сырых чанков из источника.
///
/// Каждый `next()` делает ровно один `read` на `chunk_size` байт. Короткое
/// чтение отдаётся как есть, без добора. Нулевое чтение означает конец потока:
/// итератор завершается без повторных попыток. Ошибка источника отдаётся один
/// раз, после чего итератор тоже завершается.
///
/// `ErrorKind::Interrupted` ошибкой не считается: вызов `read` прерван
/// сигналом до передачи данных и просто повторяется, как в `read_exact`.
pub struct ChunkReader<R: Read> {
    source: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(
        source: R,
        chunk_size: usize,
    ) -> Self {
        Self {
            source,
            chunk_size,
            done: false,
        }
    }

    /// Возвращает источник обратно вызывающему.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];

        loop {
            match self.source.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Some(Ok(buf));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
