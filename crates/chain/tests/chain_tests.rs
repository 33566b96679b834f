use rand::Rng;
use strata_chain::{Chain, ChainError, GENESIS_AMOUNT, GENESIS_SEED};
use strata_codec::{hash_block, hash_transaction};
use strata_crypto::{sign_block, sign_inputs, PrivateKey};
use strata_types::{Block, Hash32, Header, Transaction, TxInput, TxOutput};

fn genesis_key() -> PrivateKey {
    PrivateKey::from_seed_hex(GENESIS_SEED).expect("genesis seed")
}

fn genesis_tx_hash(chain: &Chain) -> Hash32 {
    let genesis = chain.block_by_height(0).expect("genesis");
    hash_transaction(&genesis.transactions[0])
}

fn next_header(chain: &Chain) -> Header {
    let mut rng = rand::thread_rng();
    let tip = chain.tip().expect("tip");
    Header {
        version: 1,
        height: chain.height() + 1,
        prev_hash: hash_block(&tip),
        root_hash: [0u8; 32],
        timestamp: rng.gen_range(0..i64::MAX),
    }
}

fn random_block(chain: &Chain) -> Block {
    block_with(chain, vec![])
}

fn block_with(chain: &Chain, txs: Vec<Transaction>) -> Block {
    let mut block = Block::new(next_header(chain), txs);
    sign_block(&PrivateKey::generate(), &mut block);
    block
}

/// Spend `(prev, index)` owned by `owner`, paying each `(amount, to)` pair.
fn spend(owner: &PrivateKey, prev: Hash32, index: u32, pays: &[(u64, &PrivateKey)]) -> Transaction {
    let outputs = pays
        .iter()
        .map(|(amount, to)| TxOutput::new(*amount, to.public().address().to_bytes()))
        .collect();
    let mut tx = Transaction::new(
        1,
        vec![TxInput::new(prev, index, owner.public().to_bytes())],
        outputs,
    );
    sign_inputs(owner, &mut tx);
    tx
}

#[test]
fn new_chain_has_genesis_at_height_zero() {
    let chain = Chain::in_memory().unwrap();
    assert_eq!(chain.height(), 0);
    assert!(chain.block_by_height(0).is_ok());
}

#[test]
fn chain_height_grows_by_one_per_block() {
    let mut chain = Chain::in_memory().unwrap();
    for i in 0..10 {
        let block = random_block(&chain);
        chain.add_block(block).unwrap();
        assert_eq!(chain.height(), i + 1);
    }
}

#[test]
fn added_blocks_are_retrievable_by_hash_and_height() {
    let mut chain = Chain::in_memory().unwrap();
    for i in 0..100 {
        let block = random_block(&chain);
        let block_hash = hash_block(&block);

        chain.add_block(block.clone()).unwrap();

        assert_eq!(chain.block_by_hash(&block_hash).unwrap(), block);
        assert_eq!(chain.block_by_height(i + 1).unwrap(), block);
    }
}

#[test]
fn wrong_prev_hash_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let mut block = Block::new(
        Header {
            version: 1,
            prev_hash: [0xAB; 32],
            ..Default::default()
        },
        vec![],
    );
    sign_block(&PrivateKey::generate(), &mut block);

    let err = chain.add_block(block).unwrap_err();
    assert!(matches!(err, ChainError::InvalidPrevHash { .. }));
    assert_eq!(chain.height(), 0);
}

#[test]
fn unsigned_or_tampered_block_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();

    let unsigned = Block::new(next_header(&chain), vec![]);
    assert_eq!(
        chain.add_block(unsigned),
        Err(ChainError::InvalidBlockSignature)
    );

    let mut tampered = random_block(&chain);
    tampered.header.timestamp ^= 1;
    assert_eq!(
        chain.add_block(tampered),
        Err(ChainError::InvalidBlockSignature)
    );
    assert_eq!(chain.height(), 0);
}

#[test]
fn spending_genesis_output_moves_value() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let alice = PrivateKey::generate();
    let prev = genesis_tx_hash(&chain);

    let tx = spend(&owner, prev, 0, &[(100, &alice), (900, &owner)]);
    let tx_hash = hash_transaction(&tx);
    chain.add_block(block_with(&chain, vec![tx.clone()])).unwrap();

    assert_eq!(chain.height(), 1);
    assert!(chain.utxo(&prev, 0).unwrap().spent);
    assert_eq!(chain.tx_by_hash(&tx_hash).unwrap(), tx);
    assert_eq!(chain.balance(&alice.public().address()).unwrap(), 100);
    assert_eq!(chain.balance(&owner.public().address()).unwrap(), 900);

    // the new output is spendable in turn
    let bob = PrivateKey::generate();
    let tx2 = spend(&alice, tx_hash, 0, &[(60, &bob), (40, &alice)]);
    chain.add_block(block_with(&chain, vec![tx2])).unwrap();
    assert_eq!(chain.balance(&bob.public().address()).unwrap(), 60);
    assert_eq!(chain.balance(&alice.public().address()).unwrap(), 40);
}

#[test]
fn outputs_exceeding_inputs_are_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let alice = PrivateKey::generate();
    let prev = genesis_tx_hash(&chain);

    let greedy = spend(&owner, prev, 0, &[(GENESIS_AMOUNT + 1, &alice)]);
    let err = chain.add_block(block_with(&chain, vec![greedy])).unwrap_err();
    assert_eq!(
        err,
        ChainError::InsufficientInputs {
            inputs: 1000,
            outputs: 1001
        }
    );
    assert_eq!(chain.height(), 0);
    assert!(!chain.utxo(&prev, 0).unwrap().spent);

    // the remainder, if any, is burned
    let modest = spend(&owner, prev, 0, &[(10, &alice)]);
    chain.add_block(block_with(&chain, vec![modest])).unwrap();
    assert_eq!(chain.balance(&alice.public().address()).unwrap(), 10);
    assert_eq!(chain.balance(&owner.public().address()).unwrap(), 0);
}

#[test]
fn double_spend_in_later_block_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let alice = PrivateKey::generate();
    let bob = PrivateKey::generate();
    let prev = genesis_tx_hash(&chain);

    let first = spend(&owner, prev, 0, &[(1000, &alice)]);
    chain.add_block(block_with(&chain, vec![first])).unwrap();

    let second = spend(&owner, prev, 0, &[(1000, &bob)]);
    let err = chain.add_block(block_with(&chain, vec![second])).unwrap_err();
    assert!(matches!(err, ChainError::UtxoAlreadySpent(_)));
    assert_eq!(chain.height(), 1);
    assert_eq!(chain.balance(&bob.public().address()).unwrap(), 0);
}

#[test]
fn double_spend_within_one_block_commits_nothing() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let alice = PrivateKey::generate();
    let bob = PrivateKey::generate();
    let prev = genesis_tx_hash(&chain);

    let a = spend(&owner, prev, 0, &[(500, &alice)]);
    let b = spend(&owner, prev, 0, &[(500, &bob)]);
    let a_hash = hash_transaction(&a);

    let err = chain.add_block(block_with(&chain, vec![a, b])).unwrap_err();
    assert!(matches!(err, ChainError::UtxoAlreadySpent(_)));
    assert_eq!(chain.height(), 0);
    assert!(!chain.utxo(&prev, 0).unwrap().spent);
    assert!(chain.utxo(&a_hash, 0).is_err());
    assert!(matches!(
        chain.tx_by_hash(&a_hash),
        Err(ChainError::TxNotFound(_))
    ));
}

#[test]
fn unknown_utxo_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let prev = genesis_tx_hash(&chain);

    // genesis has a single output
    let tx = spend(&owner, prev, 1, &[(1, &owner)]);
    let err = chain.add_block(block_with(&chain, vec![tx])).unwrap_err();
    assert!(matches!(err, ChainError::UtxoNotFound(_)));
}

#[test]
fn spending_someone_elses_output_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let thief = PrivateKey::generate();
    let prev = genesis_tx_hash(&chain);

    let tx = spend(&thief, prev, 0, &[(1000, &thief)]);
    let err = chain.add_block(block_with(&chain, vec![tx])).unwrap_err();
    assert!(matches!(err, ChainError::InputNotOwned(_)));
}

#[test]
fn unsigned_transaction_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let owner = genesis_key();
    let prev = genesis_tx_hash(&chain);

    let mut tx = spend(&owner, prev, 0, &[(1, &owner)]);
    tx.inputs[0].signature.clear();
    let err = chain.add_block(block_with(&chain, vec![tx])).unwrap_err();
    assert!(matches!(err, ChainError::InvalidTransactionSignature(_)));
    assert!(chain.validate_transaction(&spend(&owner, prev, 0, &[(1, &owner)])).is_ok());
}

#[test]
fn replayed_transaction_cannot_revive_spent_output() {
    let mut chain = Chain::in_memory().unwrap();
    let alice = PrivateKey::generate();
    let bob = PrivateKey::generate();

    // no inputs and nothing minted, so it passes the value check every time
    let mint = Transaction::new(
        1,
        vec![],
        vec![TxOutput::new(0, alice.public().address().to_bytes())],
    );
    let mint_hash = hash_transaction(&mint);
    chain.add_block(block_with(&chain, vec![mint.clone()])).unwrap();

    let first = spend(&alice, mint_hash, 0, &[(0, &bob)]);
    chain.add_block(block_with(&chain, vec![first])).unwrap();
    assert!(chain.utxo(&mint_hash, 0).unwrap().spent);

    let err = chain.add_block(block_with(&chain, vec![mint.clone()])).unwrap_err();
    assert_eq!(err, ChainError::DuplicateTransaction(hex::encode(mint_hash)));
    assert!(chain.utxo(&mint_hash, 0).unwrap().spent);
    assert_eq!(chain.height(), 2);

    let again = spend(&alice, mint_hash, 0, &[(0, &alice)]);
    let err = chain.add_block(block_with(&chain, vec![again])).unwrap_err();
    assert!(matches!(err, ChainError::UtxoAlreadySpent(_)));
}

#[test]
fn same_transaction_twice_in_one_block_is_rejected() {
    let mut chain = Chain::in_memory().unwrap();
    let alice = PrivateKey::generate();
    let mint = Transaction::new(
        1,
        vec![],
        vec![TxOutput::new(0, alice.public().address().to_bytes())],
    );

    let err = chain
        .add_block(block_with(&chain, vec![mint.clone(), mint]))
        .unwrap_err();
    assert!(matches!(err, ChainError::DuplicateTransaction(_)));
    assert_eq!(chain.height(), 0);
}

#[test]
fn block_height_must_follow_the_tip() {
    let mut chain = Chain::in_memory().unwrap();

    for height in [0, 2, 7] {
        let mut block = Block::new(
            Header {
                height,
                ..next_header(&chain)
            },
            vec![],
        );
        sign_block(&PrivateKey::generate(), &mut block);
        assert_eq!(
            chain.add_block(block),
            Err(ChainError::InvalidHeight { expected: 1, got: height })
        );
    }
    assert_eq!(chain.height(), 0);

    chain.add_block(random_block(&chain)).unwrap();
    assert_eq!(chain.block_by_height(1).unwrap().header.height, 1);
}
