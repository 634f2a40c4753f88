use ethers::contract::abigen;

abigen!(
    DaoModule,
    r#"[
        function getTransactionHash(address to, uint256 value, bytes data, uint8 operation, uint256 nonce) view returns (bytes32)
        function avatar() view returns (address)
    ]"#,
);

abigen!(
    MultiSend,
    r#"[
        function multiSend(bytes transactions) payable
    ]"#,
);

abigen!(
    GnosisSafe,
    r#"[
        function VERSION() view returns (string)
    ]"#,
);
