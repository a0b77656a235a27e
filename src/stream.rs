// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 字节流模块
//!
//! `ByteStream` 独占一个底层句柄（内存缓冲区或文件），并提供：
//! 1. 按能力（可读、可写、可定位）守卫的读写与定位操作，能力缺失时返回运行时错误。
//! 2. 惰性计算并缓存的能力标记与大小，写入与分离时失效。
//! 3. `detach` 交出句柄所有权，`close` 分离并立即释放。
//! 4. 深拷贝式的 `Clone`：副本总是一个内容、位置、模式都相同的内存流，不与原流共享句柄。
//!    句柄不可读时按路径重新读取内容，管道的副本为空。

use std::{
    cell::Cell,
    fmt,
    fs::{File, OpenOptions},
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
};

use bytes::Bytes;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::exception::Exception;

lazy_static! {
    static ref VALID_MODE: Regex = Regex::new(r"^[rwaxc][bt]?\+?[bt]?$").unwrap();
}

/// 内存流的引用名
pub const MEMORY_REFERENCE: &str = "memory";
/// 临时流的引用名，行为与内存流一致
pub const TEMP_REFERENCE: &str = "temp";

/// 流的底层句柄
#[derive(Debug)]
pub enum Handle {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::Memory(cursor) => cursor.read(buf),
            Handle::File(file) => file.read(buf),
        }
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Handle::Memory(cursor) => cursor.write(buf),
            Handle::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Handle::Memory(_) => Ok(()),
            Handle::File(file) => file.flush(),
        }
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Handle::Memory(cursor) => cursor.seek(pos),
            Handle::File(file) => file.seek(pos),
        }
    }
}

impl Handle {
    fn position(&self) -> io::Result<u64> {
        match self {
            Handle::Memory(cursor) => Ok(cursor.position()),
            Handle::File(file) => {
                let mut file = file;
                file.stream_position()
            }
        }
    }

    fn len(&self) -> io::Result<u64> {
        match self {
            Handle::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            Handle::File(file) => Ok(file.metadata()?.len()),
        }
    }

    /// 读出全部内容而不改变读写位置
    fn copy_bytes(&self) -> io::Result<Vec<u8>> {
        match self {
            Handle::Memory(cursor) => Ok(cursor.get_ref().clone()),
            Handle::File(file) => {
                let mut file = file;
                let position = file.stream_position()?;
                file.seek(SeekFrom::Start(0))?;
                let mut buffer = Vec::new();
                let result = file.read_to_end(&mut buffer);
                file.seek(SeekFrom::Start(position))?;
                result.map(|_| buffer)
            }
        }
    }

    #[cfg(unix)]
    fn is_fifo(&self) -> bool {
        use std::os::unix::fs::FileTypeExt;
        match self {
            Handle::Memory(_) => false,
            Handle::File(file) => file
                .metadata()
                .map(|m| m.file_type().is_fifo())
                .unwrap_or(false),
        }
    }

    #[cfg(not(unix))]
    fn is_fifo(&self) -> bool {
        false
    }
}

/// 流的元数据
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMetadata {
    pub mode: String,
    pub seekable: bool,
    pub uri: String,
}

/// 可读、可写、可定位的字节流。
#[derive(Debug)]
pub struct ByteStream {
    handle: Option<Handle>,
    mode: String,
    uri: String,
    readable: Cell<Option<bool>>,
    writable: Cell<Option<bool>>,
    seekable: Cell<Option<bool>>,
    is_pipe: Cell<Option<bool>>,
    size: Cell<Option<u64>>,
}

impl ByteStream {
    /// 以已经打开的句柄构造；`mode` 为 fopen 风格的模式串，决定可读可写能力。
    pub fn new(handle: Handle, mode: &str) -> Self {
        let uri = match &handle {
            Handle::Memory(_) => MEMORY_REFERENCE.to_string(),
            Handle::File(_) => String::new(),
        };
        Self::with_uri(handle, mode, uri)
    }

    fn with_uri(handle: Handle, mode: &str, uri: String) -> Self {
        Self {
            handle: Some(handle),
            mode: mode.to_string(),
            uri,
            readable: Cell::new(None),
            writable: Cell::new(None),
            seekable: Cell::new(None),
            is_pipe: Cell::new(None),
            size: Cell::new(None),
        }
    }

    /// 按引用打开流：`memory`、`temp` 或文件路径。
    ///
    /// # 错误处理
    /// 模式串非法或文件无法打开时返回 `InvalidStreamReference`。
    pub fn open(reference: &str, mode: &str) -> Result<Self, Exception> {
        if !VALID_MODE.is_match(mode) {
            return Err(Exception::InvalidStreamReference(format!(
                "{} (mode {})",
                reference, mode
            )));
        }
        if reference == MEMORY_REFERENCE || reference == TEMP_REFERENCE {
            let handle = Handle::Memory(Cursor::new(Vec::new()));
            return Ok(Self::with_uri(handle, mode, reference.to_string()));
        }

        let plus = mode.contains('+');
        let mut options = OpenOptions::new();
        match mode.chars().next() {
            Some('r') => options.read(true).write(plus),
            Some('w') => options.write(true).read(plus).create(true).truncate(true),
            Some('a') => options.append(true).read(plus).create(true),
            Some('x') => options.write(true).read(plus).create_new(true),
            _ => options.write(true).read(plus).create(true),
        };
        match options.open(reference) {
            Ok(file) => Ok(Self::with_uri(
                Handle::File(file),
                mode,
                reference.to_string(),
            )),
            Err(e) => {
                debug!("无法打开流 {}：{}", reference, e);
                Err(Exception::InvalidStreamReference(reference.to_string()))
            }
        }
    }

    /// 以给定内容构造一个可读写的内存流，读写位置在开头。
    pub fn from_bytes(content: impl Into<Bytes>) -> Self {
        let content: Bytes = content.into();
        Self::with_uri(
            Handle::Memory(Cursor::new(content.to_vec())),
            "w+b",
            TEMP_REFERENCE.to_string(),
        )
    }

    /// 只读的内存流，用来承载请求输入
    pub fn input(content: impl Into<Bytes>) -> Self {
        let content: Bytes = content.into();
        Self::with_uri(
            Handle::Memory(Cursor::new(content.to_vec())),
            "rb",
            "input".to_string(),
        )
    }

    /// 空的可读写临时流
    pub fn temp() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> Result<&Handle, Exception> {
        self.handle.as_ref().ok_or(Exception::StreamDetached)
    }

    fn handle_mut(&mut self) -> Result<&mut Handle, Exception> {
        self.handle.as_mut().ok_or(Exception::StreamDetached)
    }

    fn reset_cache(&self) {
        self.readable.set(None);
        self.writable.set(None);
        self.seekable.set(None);
        self.is_pipe.set(None);
        self.size.set(None);
    }

    /// 分离底层句柄并交给调用方，之后本流的所有操作都会失败。
    pub fn detach(&mut self) -> Option<Handle> {
        let handle = self.handle.take();
        self.reset_cache();
        handle
    }

    /// 分离并释放底层句柄
    pub fn close(&mut self) {
        if let Some(Handle::File(mut file)) = self.detach() {
            if let Err(e) = file.flush() {
                warn!("关闭流时刷新失败：{}", e);
            }
        }
    }

    pub fn is_readable(&self) -> bool {
        if self.handle.is_none() {
            return false;
        }
        if let Some(readable) = self.readable.get() {
            return readable;
        }
        let readable = self.mode.contains('r') || self.mode.contains('+');
        self.readable.set(Some(readable));
        readable
    }

    pub fn is_writable(&self) -> bool {
        if self.handle.is_none() {
            return false;
        }
        if let Some(writable) = self.writable.get() {
            return writable;
        }
        let writable = ['x', 'w', 'c', 'a', '+']
            .iter()
            .any(|c| self.mode.contains(*c));
        self.writable.set(Some(writable));
        writable
    }

    pub fn is_seekable(&self) -> bool {
        if self.handle.is_none() {
            return false;
        }
        if let Some(seekable) = self.seekable.get() {
            return seekable;
        }
        let seekable = !self.is_pipe();
        self.seekable.set(Some(seekable));
        seekable
    }

    /// 底层句柄是否为管道（FIFO）
    pub fn is_pipe(&self) -> bool {
        let Some(handle) = &self.handle else {
            return false;
        };
        if let Some(is_pipe) = self.is_pipe.get() {
            return is_pipe;
        }
        let is_pipe = handle.is_fifo();
        self.is_pipe.set(Some(is_pipe));
        is_pipe
    }

    /// 流的字节数，首次计算后缓存；分离后为 `None`。
    pub fn size(&self) -> Option<u64> {
        if let Some(size) = self.size.get() {
            return Some(size);
        }
        let size = self.handle.as_ref()?.len().ok()?;
        self.size.set(Some(size));
        Some(size)
    }

    pub fn tell(&self) -> Result<u64, Exception> {
        Ok(self.handle()?.position()?)
    }

    /// 读写位置是否已到末尾；分离后恒为 `true`。
    pub fn eof(&self) -> bool {
        let Some(handle) = &self.handle else {
            return true;
        };
        match (handle.position(), handle.len()) {
            (Ok(position), Ok(len)) => position >= len,
            _ => true,
        }
    }

    /// 最多读取 `length` 个字节。
    pub fn read(&mut self, length: usize) -> Result<Bytes, Exception> {
        if !self.is_readable() {
            return Err(self.missing(Exception::StreamNotReadable));
        }
        let handle = self.handle_mut()?;
        let mut buffer = Vec::with_capacity(length.min(64 * 1024));
        handle.take(length as u64).read_to_end(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    /// 写入全部字节，返回写入的字节数；缓存的大小随之失效。
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Exception> {
        if !self.is_writable() {
            return Err(self.missing(Exception::StreamNotWritable));
        }
        self.size.set(None);
        let handle = self.handle_mut()?;
        handle.write_all(data)?;
        Ok(data.len())
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, Exception> {
        if !self.is_seekable() {
            return Err(self.missing(Exception::StreamNotSeekable));
        }
        Ok(self.handle_mut()?.seek(pos)?)
    }

    pub fn rewind(&mut self) -> Result<(), Exception> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// 从当前位置读到末尾。
    pub fn get_contents(&mut self) -> Result<Bytes, Exception> {
        if !self.is_readable() {
            return Err(self.missing(Exception::StreamNotReadable));
        }
        let mut buffer = Vec::new();
        self.handle_mut()?.read_to_end(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    /// 读出全部内容且不移动读写位置。
    pub fn snapshot(&self) -> Result<Bytes, Exception> {
        if !self.is_readable() {
            return Err(self.missing(Exception::StreamNotReadable));
        }
        if !self.is_seekable() {
            return Err(Exception::StreamNotSeekable);
        }
        Ok(Bytes::from(self.handle()?.copy_bytes()?))
    }

    pub fn metadata(&self) -> Option<StreamMetadata> {
        self.handle.as_ref()?;
        Some(StreamMetadata {
            mode: self.mode.clone(),
            seekable: self.is_seekable(),
            uri: self.uri.clone(),
        })
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    fn missing(&self, capability: Exception) -> Exception {
        if self.handle.is_none() {
            Exception::StreamDetached
        } else {
            capability
        }
    }
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::temp()
    }
}

impl Clone for ByteStream {
    fn clone(&self) -> Self {
        let Some(handle) = &self.handle else {
            let mut detached = Self::temp();
            detached.handle = None;
            detached.mode = self.mode.clone();
            detached.uri = self.uri.clone();
            return detached;
        };
        let position = handle.position().unwrap_or(0);
        let handle = match handle.copy_bytes() {
            Ok(content) => {
                let mut cursor = Cursor::new(content);
                cursor.set_position(position);
                Handle::Memory(cursor)
            }
            Err(e) => {
                let content = match handle {
                    Handle::File(_) if !handle.is_fifo() => {
                        std::fs::read(&self.uri).unwrap_or_else(|reopen| {
                            warn!("无法复制流内容：{}；重新打开 {} 失败：{}", e, self.uri, reopen);
                            Vec::new()
                        })
                    }
                    _ => {
                        warn!("无法复制流内容，副本为空：{}", e);
                        Vec::new()
                    }
                };
                let mut cursor = Cursor::new(content);
                cursor.set_position(position);
                Handle::Memory(cursor)
            }
        };
        Self::with_uri(handle, &self.mode, self.uri.clone())
    }
}

/// 输出全部内容；任何失败都只记录日志并输出空串。
impl fmt::Display for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Ok(content) => f.write_str(&String::from_utf8_lossy(&content)),
            Err(e) => {
                debug!("流无法转换为字符串：{}", e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_read_and_eof() {
        let mut stream = ByteStream::from_bytes("hello world");
        assert_eq!(stream.size(), Some(11));
        assert!(!stream.eof());
        assert_eq!(&stream.read(5).unwrap()[..], b"hello");
        assert_eq!(stream.tell().unwrap(), 5);
        assert_eq!(&stream.get_contents().unwrap()[..], b" world");
        assert!(stream.eof());
    }

    #[test]
    fn test_write_invalidates_size() {
        let mut stream = ByteStream::temp();
        assert_eq!(stream.size(), Some(0));
        assert_eq!(stream.write(b"abc").unwrap(), 3);
        assert_eq!(stream.size(), Some(3));
        stream.rewind().unwrap();
        assert_eq!(stream.to_string(), "abc");
    }

    #[test]
    fn test_input_stream_is_read_only() {
        let mut stream = ByteStream::input("payload");
        assert!(stream.is_readable());
        assert!(!stream.is_writable());
        match stream.write(b"x").unwrap_err() {
            Exception::StreamNotWritable => {}
            e => panic!("unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_write_only_stream_rejects_read() {
        let mut stream = ByteStream::new(Handle::Memory(Cursor::new(Vec::new())), "w");
        stream.write(b"data").unwrap();
        assert!(matches!(stream.read(1), Err(Exception::StreamNotReadable)));
        assert_eq!(stream.to_string(), "");
    }

    #[test]
    fn test_detached_stream_fails_loudly() {
        let mut stream = ByteStream::from_bytes("abc");
        let handle = stream.detach();
        assert!(matches!(handle, Some(Handle::Memory(_))));
        assert!(stream.eof());
        assert_eq!(stream.size(), None);
        assert!(stream.metadata().is_none());
        assert!(matches!(stream.tell(), Err(Exception::StreamDetached)));
        assert!(matches!(stream.write(b"x"), Err(Exception::StreamDetached)));
        assert!(matches!(stream.read(1), Err(Exception::StreamDetached)));
        assert!(matches!(stream.rewind(), Err(Exception::StreamDetached)));
        assert_eq!(stream.to_string(), "");
        assert!(stream.detach().is_none());
    }

    #[test]
    fn test_close_detaches() {
        let mut stream = ByteStream::from_bytes("abc");
        stream.close();
        assert!(!stream.is_attached());
        assert!(!stream.is_readable());
    }

    #[test]
    fn test_display_keeps_position() {
        let mut stream = ByteStream::from_bytes("abcdef");
        stream.read(2).unwrap();
        assert_eq!(stream.to_string(), "abcdef");
        assert_eq!(stream.tell().unwrap(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = ByteStream::from_bytes("abc");
        original.seek(SeekFrom::End(0)).unwrap();
        let mut copy = original.clone();
        assert_eq!(copy.tell().unwrap(), 3);
        copy.write(b"def").unwrap();
        assert_eq!(copy.to_string(), "abcdef");
        assert_eq!(original.to_string(), "abc");
    }

    #[test]
    fn test_clone_of_write_only_file_does_not_share_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.bin");
        let path = path.to_str().unwrap();
        let mut original = ByteStream::open(path, "wb").unwrap();
        original.write(b"abc").unwrap();

        let mut copy = original.clone();
        assert_eq!(copy.tell().unwrap(), 3);
        assert_eq!(copy.size(), Some(3));
        copy.write(b"defgh").unwrap();
        assert_eq!(copy.tell().unwrap(), 8);
        assert_eq!(original.tell().unwrap(), 3);
        assert_eq!(original.size(), Some(3));
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn test_open_rejects_bad_mode_and_missing_file() {
        assert!(matches!(
            ByteStream::open("memory", "q"),
            Err(Exception::InvalidStreamReference(_))
        ));
        assert!(matches!(
            ByteStream::open("/definitely/not/here.txt", "r"),
            Err(Exception::InvalidStreamReference(_))
        ));
        let stream = ByteStream::open("temp", "r+").unwrap();
        let metadata = stream.metadata().unwrap();
        assert_eq!(metadata.uri, "temp");
        assert!(metadata.seekable);
    }
}
