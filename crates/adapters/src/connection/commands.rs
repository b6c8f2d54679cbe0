//! Which arguments of each command are recorded as payload.
//!
//! Arguments are the ones following the command name. Key-bearing commands
//! report their key (or keys), scripting and scanning commands report the
//! script, digest, pattern, or cursor. Administrative commands, and anything
//! not listed, report nothing.

/// Selection of payload arguments for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    /// No payload.
    None,
    /// The first argument.
    First,
    /// Every argument.
    All,
    /// Every argument except the last (blocking pops end with a timeout).
    AllButLast,
    /// Every argument from this index on.
    From(usize),
    /// Only the argument at this index.
    At(usize),
}

impl KeySpec {
    /// Apply the selection to `args`, clamping to what is present.
    pub fn select<'a, 'b>(self, args: &'b [&'a [u8]]) -> &'b [&'a [u8]] {
        let range = match self {
            Self::None => 0..0,
            Self::First => 0..args.len().min(1),
            Self::All => 0..args.len(),
            Self::AllButLast => 0..args.len().saturating_sub(1),
            Self::From(index) => index.min(args.len())..args.len(),
            Self::At(index) if index < args.len() => index..index + 1,
            Self::At(_) => 0..0,
        };
        args.get(range).unwrap_or_default()
    }
}

/// Look up the payload selection for `name`, ignoring ASCII case.
pub fn key_spec(name: &[u8]) -> KeySpec {
    let Ok(name) = std::str::from_utf8(name) else {
        return KeySpec::None;
    };
    match name.to_ascii_uppercase().as_str() {
        // strings
        "APPEND" | "BITCOUNT" | "BITFIELD" | "BITPOS" | "DECR" | "DECRBY" | "GET" | "GETBIT"
        | "GETDEL" | "GETEX" | "GETRANGE" | "GETSET" | "INCR" | "INCRBY" | "INCRBYFLOAT"
        | "PSETEX" | "SET" | "SETBIT" | "SETEX" | "SETNX" | "SETRANGE" | "STRLEN" | "SUBSTR" => {
            KeySpec::First
        },
        "MGET" | "MSET" | "MSETNX" => KeySpec::All,
        "BITOP" => KeySpec::From(2),

        // generic keyspace
        "DUMP" | "EXPIRE" | "EXPIREAT" | "MOVE" | "PERSIST" | "PEXPIRE" | "PEXPIREAT" | "PTTL"
        | "RESTORE" | "SORT" | "TTL" | "TYPE" => KeySpec::First,
        "DEL" | "EXISTS" | "TOUCH" | "UNLINK" | "WATCH" => KeySpec::All,
        "KEYS" | "SCAN" => KeySpec::First,
        "MIGRATE" => KeySpec::At(2),
        "ECHO" => KeySpec::First,

        // hashes
        "HDEL" | "HEXISTS" | "HGET" | "HGETALL" | "HINCRBY" | "HINCRBYFLOAT" | "HKEYS" | "HLEN"
        | "HMGET" | "HMSET" | "HSCAN" | "HSET" | "HSETNX" | "HSTRLEN" | "HVALS" => KeySpec::First,

        // lists
        "LINDEX" | "LINSERT" | "LLEN" | "LPOP" | "LPUSH" | "LPUSHX" | "LRANGE" | "LREM" | "LSET"
        | "LTRIM" | "RPOP" | "RPOPLPUSH" | "RPUSH" | "RPUSHX" => KeySpec::First,
        "BLPOP" | "BRPOP" => KeySpec::AllButLast,

        // sets
        "SADD" | "SCARD" | "SDIFFSTORE" | "SINTERSTORE" | "SISMEMBER" | "SMEMBERS" | "SMOVE"
        | "SPOP" | "SRANDMEMBER" | "SREM" | "SSCAN" | "SUNIONSTORE" => KeySpec::First,
        "SDIFF" | "SINTER" | "SUNION" => KeySpec::All,

        // sorted sets
        "ZADD" | "ZCARD" | "ZCOUNT" | "ZINCRBY" | "ZINTERSTORE" | "ZLEXCOUNT" | "ZRANGE"
        | "ZRANGEBYLEX" | "ZRANGEBYSCORE" | "ZRANK" | "ZREM" | "ZREMRANGEBYLEX"
        | "ZREMRANGEBYRANK" | "ZREMRANGEBYSCORE" | "ZREVRANGE" | "ZREVRANGEBYLEX"
        | "ZREVRANGEBYSCORE" | "ZREVRANK" | "ZSCAN" | "ZSCORE" | "ZUNIONSTORE" => KeySpec::First,

        // geo and hyperloglog
        "GEOADD" | "GEODIST" | "GEOHASH" | "GEOPOS" | "GEORADIUS" | "GEORADIUSBYMEMBER"
        | "PFADD" | "PFMERGE" => KeySpec::First,
        "PFCOUNT" => KeySpec::All,

        // scripting
        "EVAL" | "EVALSHA" => KeySpec::First,
        "SCRIPT" => KeySpec::From(1),

        // pub/sub
        "SUBSCRIBE" | "PSUBSCRIBE" | "UNSUBSCRIBE" | "PUNSUBSCRIBE" => KeySpec::All,
        "PUBLISH" => KeySpec::First,

        _ => KeySpec::None,
    }
}
